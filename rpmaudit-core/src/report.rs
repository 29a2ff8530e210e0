//! Differential report of unavailable packages per image

use serde::Serialize;
use std::collections::BTreeMap;

use crate::{ImageName, PackageSet};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DifferentialReport {
    /// Packages of each audited image that the reference environment cannot provide.
    pub missing: BTreeMap<ImageName, PackageSet>,

    /// Images that could not be audited, with the reason.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub failed: BTreeMap<ImageName, String>,
}

impl DifferentialReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_missing(&mut self, image: ImageName, packages: PackageSet) {
        self.missing.insert(image, packages);
    }

    pub fn record_failure(&mut self, image: ImageName, reason: String) {
        self.failed.insert(image, reason);
    }

    /// Number of images with a complete result.
    pub fn audited_images(&self) -> usize {
        self.missing.len()
    }

    /// Total missing packages across images, counting shared names per image.
    pub fn total_missing(&self) -> usize {
        self.missing.values().map(|p| p.len()).sum()
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
