//! Workspace-wide install file index.
//!
//! The index lists every artifact any configuration of any module can
//! produce. It is computed once per workspace root and kept for the rest of
//! the process; edits to definition files made afterwards are not seen.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use anyhow::Result;

use crate::core::dependency::extend_unique;
use crate::core::workspace::Workspace;
use crate::util::diagnostic::{emit, Diagnostic};

/// Memoized indexes by workspace root
static INDEX: LazyLock<RwLock<HashMap<PathBuf, Arc<Vec<String>>>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// Every artifact of every module with a definition, as `module/path`.
///
/// Modules whose definition cannot be loaded are reported and skipped.
pub fn all_install_files(ws: &Workspace) -> Result<Arc<Vec<String>>> {
    let root = ws.root().to_path_buf();

    // Fast path: already computed (read lock only)
    {
        let index = INDEX.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(files) = index.get(&root) {
            return Ok(Arc::clone(files));
        }
    }

    // Slow path: compute under the write lock so it happens once
    let mut index = INDEX.write().unwrap_or_else(PoisonError::into_inner);

    // Double-check after acquiring write lock
    if let Some(files) = index.get(&root) {
        return Ok(Arc::clone(files));
    }

    let mut files = Vec::new();
    for module in ws.modules()? {
        if !ws.has_definition(&module) {
            continue;
        }
        match module_install_files(ws, &module) {
            Ok(module_files) => files.extend(module_files),
            Err(err) => emit(&Diagnostic::missing_or_unparsable_definition(
                &module,
                format!("{:#}", err),
            )),
        }
    }
    tracing::debug!(
        "indexed {} install files in {}",
        files.len(),
        root.display()
    );

    let files = Arc::new(files);
    index.insert(root, Arc::clone(&files));
    Ok(files)
}

/// Distinct artifacts over all configurations of one module, as
/// `module/path`. Not memoized.
pub fn module_install_files(ws: &Workspace, module: &str) -> Result<Vec<String>> {
    let Some(definition) = ws.load_definition(module)? else {
        return Ok(Vec::new());
    };

    let mut artifacts = Vec::new();
    for configuration in definition.configurations() {
        if let Some(install) = &configuration.install_section {
            extend_unique(&mut artifacts, &install.artifacts);
        }
    }

    Ok(artifacts
        .into_iter()
        .map(|artifact| format!("{}/{}", module, artifact))
        .collect())
}
