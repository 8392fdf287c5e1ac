//! Workspace scanning
//!
//! The [`Scanner`] turns a directory into a [`WorkspaceDescriptor`]: primary
//! language and framework, unioned capability and signal tags, and a derived
//! [`ProjectType`]. Both the phase classifier and the router consume it.

mod descriptor;
mod scanner;

pub use descriptor::{derive_project_type, ProjectType, WorkspaceDescriptor, UNKNOWN_LANGUAGE};
pub use scanner::{validate_workspace, ScanError, Scanner};
