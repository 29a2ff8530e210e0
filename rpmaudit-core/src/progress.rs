//! Audit progress notifications
//!
//! The auditor reports where it is through an [`AuditProgress`] observer.
//! Every method defaults to doing nothing, so observers only implement the
//! events they render.

/// Observer of a running audit.
pub trait AuditProgress: Send + Sync {
    /// Images left after exclusion, before any is extracted.
    fn images_started(&self, _total: usize) {}

    fn image_started(&self, _image: &str) {}

    /// The image's inventory was taken and `total` lookups follow.
    fn lookups_started(&self, _image: &str, _total: usize) {}

    fn looking_up(&self, _image: &str, _package: &str) {}

    fn looked_up(&self, _image: &str, _package: &str) {}

    /// Called once per image whether it was audited or failed.
    fn image_finished(&self, _image: &str) {}
}

/// Observer that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl AuditProgress for NoProgress {}
