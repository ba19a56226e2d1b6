//! High-level operations.
//!
//! Entry points an application calls: the dependency consistency check and
//! the built-info store.

pub mod built_info;
pub mod check_deps;

pub use built_info::{
    has_all_output, record_built_module, remove_module_from_built_info, BuiltInfo,
    BuiltInfoStorage, BUILT_INFO_LOCK,
};
pub use check_deps::{
    check_deps, CheckDepsResult, DepsChecker, ReferenceExtractor, ReferenceWithProject,
};
