//! Resolution over the workspace.
//!
//! Everything here reads module definitions from disk and derives data that
//! spans several modules: the install closure of a module and the
//! workspace-wide install file index.

pub mod errors;
pub mod index;
pub mod install;

pub use errors::ResolveError;
pub use index::{all_install_files, module_install_files};
pub use install::InstallCollector;
