//! Core data structures for Bunch.
//!
//! This module contains the foundational types used throughout Bunch:
//! - Packages and their link markers
//! - The Bunchfile manifest and its lockfile
//! - The workspace layout packages are installed into

pub mod lockfile;
pub mod manifest;
pub mod package;
pub mod workspace;

pub use lockfile::Lockfile;
pub use manifest::Manifest;
pub use package::Package;
pub use workspace::{Workspace, LOCKFILE_NAME, MANIFEST_NAME};
