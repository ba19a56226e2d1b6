//! Built-info store.
//!
//! Records which configuration of each module was last built, persisted as
//! `.cement/built-info.json` in the workspace. Every read-modify-write of the
//! store happens while holding [`BUILT_INFO_LOCK`]; the storage methods take
//! the guard so the lock cannot be forgotten.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::workspace::Workspace;
use crate::util::fs::{read_to_string, write_string};

/// File name of the store inside the `.cement` directory.
pub const BUILT_INFO_FILE: &str = "built-info.json";

/// The process-wide lock guarding the built-info store.
pub static BUILT_INFO_LOCK: BuiltInfoLock = BuiltInfoLock::new();

/// Named lock for built-info read-modify-write sequences.
#[derive(Debug)]
pub struct BuiltInfoLock {
    inner: Mutex<()>,
}

/// Proof that [`BUILT_INFO_LOCK`] is held.
pub struct BuiltInfoGuard<'a> {
    _guard: MutexGuard<'a, ()>,
}

impl BuiltInfoLock {
    pub const fn new() -> Self {
        BuiltInfoLock {
            inner: Mutex::new(()),
        }
    }

    /// Block until the lock is held.
    pub fn acquire(&self) -> BuiltInfoGuard<'_> {
        BuiltInfoGuard {
            _guard: self.inner.lock().unwrap_or_else(PoisonError::into_inner),
        }
    }
}

impl Default for BuiltInfoLock {
    fn default() -> Self {
        Self::new()
    }
}

/// What a module was last built with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuiltInfo {
    /// Configuration that was built
    pub configuration: String,

    /// Dependencies of that configuration, as `name[/configuration]`
    #[serde(default)]
    pub deps: Vec<String>,
}

/// The persisted record set.
#[derive(Debug, Clone, Default)]
pub struct BuiltInfoStorage {
    path: PathBuf,
    modules: BTreeMap<String, BuiltInfo>,
}

impl BuiltInfoStorage {
    /// Path of the store in a workspace.
    pub fn path_in(ws: &Workspace) -> PathBuf {
        ws.cement_dir().join(BUILT_INFO_FILE)
    }

    /// Read the store. A missing file is an empty store.
    pub fn load(ws: &Workspace, _lock: &BuiltInfoGuard<'_>) -> Result<Self> {
        Self::load_from(Self::path_in(ws))
    }

    fn load_from(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            return Ok(BuiltInfoStorage {
                path,
                modules: BTreeMap::new(),
            });
        }

        let contents = read_to_string(&path)?;
        let modules = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse built info: {}", path.display()))?;
        Ok(BuiltInfoStorage { path, modules })
    }

    /// Write the store back.
    pub fn save(&self, _lock: &BuiltInfoGuard<'_>) -> Result<()> {
        let contents =
            serde_json::to_string_pretty(&self.modules).context("failed to serialize built info")?;
        write_string(&self.path, &contents)
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, module: &str) -> Option<&BuiltInfo> {
        self.modules.get(module)
    }

    pub fn insert(&mut self, module: impl Into<String>, info: BuiltInfo) {
        self.modules.insert(module.into(), info);
    }

    pub fn remove(&mut self, module: &str) -> Option<BuiltInfo> {
        self.modules.remove(module)
    }

    pub fn modules(&self) -> impl Iterator<Item = (&str, &BuiltInfo)> {
        self.modules.iter().map(|(name, info)| (name.as_str(), info))
    }
}

/// Forget that a module was built.
pub fn remove_module_from_built_info(ws: &Workspace, module: &str) -> Result<()> {
    let guard = BUILT_INFO_LOCK.acquire();
    let mut storage = BuiltInfoStorage::load(ws, &guard)?;
    if storage.remove(module).is_some() {
        tracing::debug!("removed `{}` from built info", module);
    }
    storage.save(&guard)
}

/// Remember that a module was built with a configuration.
pub fn record_built_module(ws: &Workspace, module: &str, info: BuiltInfo) -> Result<()> {
    let guard = BUILT_INFO_LOCK.acquire();
    let mut storage = BuiltInfoStorage::load(ws, &guard)?;
    storage.insert(module, info);
    storage.save(&guard)
}

/// Check if every artifact of a module configuration exists on disk.
///
/// Modules without a definition count as built unless `require_definition`
/// is set. Configurations without install data always count as built.
pub fn has_all_output(
    ws: &Workspace,
    module: &str,
    configuration: Option<&str>,
    require_definition: bool,
) -> Result<bool> {
    let Some(definition) = ws.load_definition(module)? else {
        return Ok(!require_definition);
    };

    let Some(install) = &definition.configuration_or_default(configuration)?.install_section else {
        return Ok(true);
    };

    let module_dir = ws.module_dir(module);
    let missing = install
        .artifacts
        .iter()
        .map(|artifact| module_dir.join(artifact.replace('\\', "/")))
        .find(|path| !path.exists());

    if let Some(path) = &missing {
        tracing::debug!("`{}` is missing output {}", module, path.display());
    }
    Ok(missing.is_none())
}
