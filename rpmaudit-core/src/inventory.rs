//! Installed package inventories of release images

use std::collections::BTreeSet;
use tracing::debug;

use crate::{Error, InventorySource, PackageName, Result};

/// Deduplicated set of installed package names.
pub type PackageSet = BTreeSet<PackageName>;

/// Split raw inventory output into a package set.
pub fn parse_package_list(output: &str) -> PackageSet {
    output.split_whitespace().map(str::to_string).collect()
}

/// Extracts package sets from images through an [`InventorySource`].
pub struct ImageInventory<'a, S: InventorySource + ?Sized> {
    source: &'a S,
}

impl<'a, S: InventorySource + ?Sized> ImageInventory<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// Extract the installed package set of one image.
    pub async fn extract(&self, pull_ref: &str) -> Result<PackageSet> {
        let output = self
            .source
            .installed_packages(pull_ref)
            .await
            .map_err(|e| match e {
                Error::Extraction { .. } => e,
                other => Error::extraction(pull_ref, other),
            })?;

        let packages = parse_package_list(&output);
        debug!("{} has {} installed packages", pull_ref, packages.len());
        Ok(packages)
    }
}
