//! Release audit driver
//!
//! Resolves a release, skips excluded images, extracts each remaining
//! image's package set, and collects the packages the reference environment
//! cannot provide.

use futures::stream::{self, StreamExt};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

use crate::{
    AuditProgress, AvailabilityCache, AvailabilityOracle, DifferentialReport, Error, ImageInventory, ImageName,
    InventorySource, NoProgress, PackageSet, ReferenceEnvironment, ReleaseResolver, ReleaseSource,
    Result, DEFAULT_EXCLUSIONS,
};

/// What to do when a single image cannot be audited
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Record the image under `failed` and keep going.
    #[default]
    Isolate,
    /// Abort the whole run on the first failure.
    FailFast,
}

#[derive(Debug, Clone)]
pub struct AuditOptions {
    /// Images never extracted or queried.
    pub exclusions: BTreeSet<ImageName>,
    pub failure_policy: FailurePolicy,
    /// Images processed concurrently.
    pub jobs: usize,
    /// Queries allowed against the reference environment at once.
    pub query_jobs: usize,
}

impl Default for AuditOptions {
    fn default() -> Self {
        Self {
            exclusions: DEFAULT_EXCLUSIONS.iter().map(|s| s.to_string()).collect(),
            failure_policy: FailurePolicy::default(),
            jobs: 1,
            query_jobs: 1,
        }
    }
}

impl AuditOptions {
    /// Options with an empty exclusion list.
    pub fn without_exclusions() -> Self {
        Self {
            exclusions: BTreeSet::new(),
            ..Self::default()
        }
    }

    pub fn exclude<I, S>(mut self, images: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ImageName>,
    {
        self.exclusions.extend(images.into_iter().map(Into::into));
        self
    }

    pub fn is_excluded(&self, image: &str) -> bool {
        self.exclusions.contains(image)
    }
}

/// Reject release identifiers that cannot name a release.
pub fn validate_release_id(release: &str) -> Result<()> {
    if release.trim().is_empty() {
        return Err(Error::Input("release identifier is empty".into()));
    }
    if release.chars().any(char::is_whitespace) {
        return Err(Error::Input(format!(
            "release identifier '{}' contains whitespace",
            release
        )));
    }
    Ok(())
}

pub struct Auditor<'a, R, I, G>
where
    R: ReleaseSource + ?Sized,
    I: InventorySource + ?Sized,
    G: ReferenceEnvironment + ?Sized,
{
    releases: &'a R,
    inventories: &'a I,
    reference: &'a G,
    options: AuditOptions,
    progress: &'a dyn AuditProgress,
}

impl<'a, R, I, G> Auditor<'a, R, I, G>
where
    R: ReleaseSource + ?Sized,
    I: InventorySource + ?Sized,
    G: ReferenceEnvironment + ?Sized,
{
    pub fn new(releases: &'a R, inventories: &'a I, reference: &'a G, options: AuditOptions) -> Self {
        Self {
            releases,
            inventories,
            reference,
            options,
            progress: &NoProgress,
        }
    }

    /// Report progress to `progress` instead of discarding it.
    pub fn with_progress(mut self, progress: &'a dyn AuditProgress) -> Self {
        self.progress = progress;
        self
    }

    /// Audit one release.
    ///
    /// Each call uses a fresh availability cache.
    pub async fn run(&self, release: &str) -> Result<DifferentialReport> {
        validate_release_id(release)?;

        let images = ReleaseResolver::new(self.releases).resolve(release).await?;
        let targets: Vec<_> = images
            .into_iter()
            .filter(|(image, _)| {
                let excluded = self.options.is_excluded(image);
                if excluded {
                    info!("Skipping {}", image);
                }
                !excluded
            })
            .collect();

        let mut report = DifferentialReport::new();
        if targets.is_empty() {
            info!("No images to audit");
            return Ok(report);
        }

        let cache = AvailabilityCache::new();
        let oracle = AvailabilityOracle::connect(self.reference, &cache, self.options.query_jobs).await?;
        let inventory = ImageInventory::new(self.inventories);

        let total = targets.len();
        info!("Auditing {} images", total);
        self.progress.images_started(total);

        let oracle = &oracle;
        let inventory = &inventory;
        let progress = self.progress;
        let mut outcomes = stream::iter(targets)
            .map(move |(image, pull_ref)| async move {
                progress.image_started(&image);
                let outcome = audit_image(inventory, oracle, progress, &image, &pull_ref).await;
                (image, outcome)
            })
            .buffer_unordered(self.options.jobs.max(1));

        let mut done = 0;
        while let Some((image, outcome)) = outcomes.next().await {
            done += 1;
            self.progress.image_finished(&image);
            match outcome {
                Ok(missing) => {
                    info!(
                        "[{}/{}] {}: {} packages not found in reference",
                        done,
                        total,
                        image,
                        missing.len()
                    );
                    report.record_missing(image, missing);
                }
                Err(e) if e.is_per_image() && self.options.failure_policy == FailurePolicy::Isolate => {
                    warn!("[{}/{}] Failed to audit {}: {}", done, total, image, e);
                    report.record_failure(image, e.to_string());
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            "Looked up {} distinct packages ({} queries)",
            cache.len(),
            oracle.queries_issued()
        );
        Ok(report)
    }
}

async fn audit_image<I, G>(
    inventory: &ImageInventory<'_, I>,
    oracle: &AvailabilityOracle<'_, G>,
    progress: &dyn AuditProgress,
    image: &str,
    pull_ref: &str,
) -> Result<PackageSet>
where
    I: InventorySource + ?Sized,
    G: ReferenceEnvironment + ?Sized,
{
    info!("Fetching RPM list from {}", image);
    let packages = inventory.extract(pull_ref).await?;
    progress.lookups_started(image, packages.len());

    let mut missing = PackageSet::new();
    for package in &packages {
        progress.looking_up(image, package);
        let available = oracle.is_available(package).await?;
        progress.looked_up(image, package);
        if !available {
            debug!("{} is not provided by the reference environment", package);
            missing.insert(package.clone());
        }
    }
    Ok(missing)
}
