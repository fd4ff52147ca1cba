//! High-level operations.
//!
//! This module contains the implementation of Bunch commands.

pub mod generate;
pub mod graph;
pub mod install;
pub mod lock;
pub mod outdated;

pub use generate::{filter_common_base_packages, generate};
pub use graph::{ConflictError, DependencyGraph, PruneReport, RemoveReport, UsageMap};
pub use install::{InstallOptions, InstallReport, InstallState, Installer, PackageOutcome};
pub use lock::{lock, LockReport};
pub use outdated::{outdated, OutdatedEntry, OutdatedOptions};
