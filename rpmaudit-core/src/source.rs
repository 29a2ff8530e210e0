//! Collaborator interfaces consumed by the audit engine
//!
//! Each trait hides one external tool. The engine only sees strings and
//! booleans; spawning processes is left to the implementations.

use async_trait::async_trait;

use crate::Result;

/// Source of release metadata documents.
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    /// Fetch the raw JSON release document for a release identifier.
    ///
    /// Unreachable or unknown releases must be reported as
    /// [`Error::ReleaseResolution`](crate::Error::ReleaseResolution).
    async fn release_info(&self, release: &str) -> Result<String>;
}

/// Runs the inventory query inside a throwaway instance of an image.
#[async_trait]
pub trait InventorySource: Send + Sync {
    /// Whitespace separated names of every package installed in the image.
    async fn installed_packages(&self, pull_ref: &str) -> Result<String>;
}

/// Long-lived environment that answers "is this package obtainable".
#[async_trait]
pub trait ReferenceEnvironment: Send + Sync {
    /// Whether the environment is up and can take queries.
    async fn is_active(&self) -> Result<bool>;

    /// Start and prime the environment.
    async fn activate(&self) -> Result<()>;

    /// Ask the reference repositories whether anything provides `package`.
    ///
    /// `Ok(false)` is a successful negative answer. Failing to run the query
    /// at all must be [`Error::AvailabilityQuery`](crate::Error::AvailabilityQuery).
    async fn query_provides(&self, package: &str) -> Result<bool>;

    /// Tear the environment down.
    async fn deactivate(&self) -> Result<()>;
}
