//! rpmaudit-core: Cross-referencing engine for release RPM audits
//!
//! This crate provides:
//! - Release document parsing into an image name to pull spec mapping
//! - Installed package inventories for release images
//! - Memoized package availability lookups against a reference environment
//! - Per-image differential reports of unavailable packages
//! - Progress notifications while a release is audited

pub mod audit;
pub mod cache;
pub mod error;
pub mod inventory;
pub mod oracle;
pub mod progress;
pub mod release;
pub mod report;
pub mod source;

#[cfg(test)]
mod testing;

pub use audit::{AuditOptions, Auditor, FailurePolicy};
pub use cache::AvailabilityCache;
pub use error::{Error, Result};
pub use inventory::{parse_package_list, ImageInventory, PackageSet};
pub use oracle::AvailabilityOracle;
pub use progress::{AuditProgress, NoProgress};
pub use release::{ReleaseImages, ReleaseInfo, ReleaseResolver};
pub use report::DifferentialReport;
pub use source::{InventorySource, ReferenceEnvironment, ReleaseSource};

/// Logical name of an image within a release (e.g. `cli`, `installer`).
pub type ImageName = String;

/// Addressable locator of a container image, usually `registry/repo@sha256:...`.
pub type PullReference = String;

/// Name of an installable package.
pub type PackageName = String;

/// Images that are built by a separate pipeline and never audited.
pub const DEFAULT_EXCLUSIONS: [&str; 4] = [
    "fedora-coreos",
    "machine-os-content",
    "ironic",
    "ironic-agent",
];
