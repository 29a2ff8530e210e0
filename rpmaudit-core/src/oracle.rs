//! Memoized package availability lookups
//!
//! The oracle answers "can the reference environment provide this package"
//! and records every answer in the run's [`AvailabilityCache`]. Queries to
//! the environment go through a semaphore so the environment stays a single
//! logical resource unless more permits are granted.

use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Semaphore;
use tracing::{debug, info};

use crate::{AvailabilityCache, Error, ReferenceEnvironment, Result};

/// Bring the reference environment up if it isn't already.
pub async fn ensure_active<G: ReferenceEnvironment + ?Sized>(gateway: &G) -> Result<()> {
    if gateway.is_active().await? {
        debug!("Reference environment already running");
        return Ok(());
    }

    info!("Starting reference environment and refreshing repositories");
    gateway.activate().await.map_err(|e| match e {
        Error::ReferenceEnvironment(_) => e,
        other => Error::ReferenceEnvironment(other.to_string()),
    })
}

pub struct AvailabilityOracle<'a, G: ReferenceEnvironment + ?Sized> {
    gateway: &'a G,
    cache: &'a AvailabilityCache,
    permits: Semaphore,
    queries: AtomicUsize,
}

impl<'a, G: ReferenceEnvironment + ?Sized> AvailabilityOracle<'a, G> {
    /// Acquire the reference environment and build an oracle over it.
    ///
    /// `query_jobs` bounds how many queries may run against the environment
    /// at once; zero is treated as one.
    pub async fn connect(
        gateway: &'a G,
        cache: &'a AvailabilityCache,
        query_jobs: usize,
    ) -> Result<Self> {
        ensure_active(gateway).await?;
        Ok(Self {
            gateway,
            cache,
            permits: Semaphore::new(query_jobs.clamp(1, Semaphore::MAX_PERMITS)),
            queries: AtomicUsize::new(0),
        })
    }

    /// Whether `package` is obtainable from the reference environment.
    pub async fn is_available(&self, package: &str) -> Result<bool> {
        if let Some(available) = self.cache.get(package) {
            debug!("Cache hit for {}: {}", package, available);
            return Ok(available);
        }

        self.cache
            .get_or_query(package, || async {
                let _permit = self
                    .permits
                    .acquire()
                    .await
                    .map_err(|e| Error::query(package, e))?;

                debug!("Looking up {} in reference environment", package);
                self.queries.fetch_add(1, Ordering::Relaxed);
                self.gateway
                    .query_provides(package)
                    .await
                    .map_err(|e| match e {
                        Error::AvailabilityQuery { .. } => e,
                        other => Error::query(package, other),
                    })
            })
            .await
    }

    /// Number of queries issued against the reference environment.
    pub fn queries_issued(&self) -> usize {
        self.queries.load(Ordering::Relaxed)
    }

    pub fn cache(&self) -> &AvailabilityCache {
        self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeReference;

    #[tokio::test]
    async fn test_connect_activates_inactive_environment() {
        let gateway = FakeReference::inactive().provides(&["bash"]);
        let cache = AvailabilityCache::new();
        AvailabilityOracle::connect(&gateway, &cache, 1).await.unwrap();
        assert_eq!(gateway.activations(), 1);
    }

    #[tokio::test]
    async fn test_connect_skips_active_environment() {
        let gateway = FakeReference::active();
        let cache = AvailabilityCache::new();
        AvailabilityOracle::connect(&gateway, &cache, 1).await.unwrap();
        AvailabilityOracle::connect(&gateway, &cache, 1).await.unwrap();
        assert_eq!(gateway.activations(), 0);
    }

    #[tokio::test]
    async fn test_connect_reports_activation_failure() {
        let gateway = FakeReference::inactive().failing_activation();
        let cache = AvailabilityCache::new();
        let err = AvailabilityOracle::connect(&gateway, &cache, 1)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, Error::ReferenceEnvironment(_)));
    }

    #[tokio::test]
    async fn test_lookups_are_memoized() {
        let gateway = FakeReference::active().provides(&["bash"]);
        let cache = AvailabilityCache::new();
        let oracle = AvailabilityOracle::connect(&gateway, &cache, 1).await.unwrap();

        assert!(oracle.is_available("bash").await.unwrap());
        assert!(oracle.is_available("bash").await.unwrap());
        assert!(!oracle.is_available("ostree").await.unwrap());
        assert!(!oracle.is_available("ostree").await.unwrap());

        assert_eq!(gateway.queries_for("bash"), 1);
        assert_eq!(gateway.queries_for("ostree"), 1);
        assert_eq!(oracle.queries_issued(), 2);
        assert_eq!(oracle.cache().len(), 2);
    }

    #[tokio::test]
    async fn test_query_error_is_not_a_negative_answer() {
        let gateway = FakeReference::active().broken_for(&["glibc"]);
        let cache = AvailabilityCache::new();
        let oracle = AvailabilityOracle::connect(&gateway, &cache, 1).await.unwrap();

        let err = oracle.is_available("glibc").await.unwrap_err();
        assert!(matches!(err, Error::AvailabilityQuery { ref package, .. } if package == "glibc"));
        assert_eq!(cache.get("glibc"), None);

        // Not cached, so the next lookup asks again.
        assert!(oracle.is_available("glibc").await.is_err());
        assert_eq!(gateway.queries_for("glibc"), 2);
    }

    #[tokio::test]
    async fn test_concurrent_lookups_query_once() {
        let gateway = FakeReference::active().provides(&["bash"]).with_delay(20);
        let cache = AvailabilityCache::new();
        let oracle = AvailabilityOracle::connect(&gateway, &cache, 4).await.unwrap();

        let lookups = (0..8).map(|_| oracle.is_available("bash"));
        let answers = futures::future::join_all(lookups).await;

        assert!(answers.into_iter().all(|a| a.unwrap()));
        assert_eq!(gateway.queries_for("bash"), 1);
    }
}
