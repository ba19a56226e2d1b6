//! Core data structures.
//!
//! This module contains the module definition model:
//! - Configuration headers and the inheritance hierarchy
//! - Dependency references
//! - Build and install sections
//! - The workspace accessor

pub mod build;
pub mod configuration;
pub mod definition;
pub mod dependency;
pub mod hierarchy;
pub mod install;
pub mod workspace;

pub use build::BuildTarget;
pub use configuration::ConfigurationLine;
pub use definition::{Defaults, ModuleConfiguration, ModuleDefinition, Settings};
pub use dependency::Dep;
pub use hierarchy::ConfigurationHierarchy;
pub use install::{InstallData, InstallSection};
pub use workspace::Workspace;
