//! Cement - module configuration and dependency resolution
//!
//! This crate provides the core library functionality for a cement
//! workspace: parsing module definitions, resolving configuration
//! inheritance, expanding install closures and checking declared
//! dependencies against actual project references.

pub mod core;
pub mod ops;
pub mod resolver;
pub mod util;

/// Test utilities and workspace fixtures for unit tests.
#[cfg(test)]
pub mod test_support;

pub use core::{
    definition::ModuleDefinition, dependency::Dep, hierarchy::ConfigurationHierarchy,
    install::InstallData, workspace::Workspace,
};

pub use ops::{check_deps, CheckDepsResult, DepsChecker, ReferenceExtractor};
pub use resolver::{InstallCollector, ResolveError};
