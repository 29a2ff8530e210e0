//! Release documents via `oc adm release info`

use async_trait::async_trait;
use rpmaudit_core::{Error, ReleaseSource, Result};
use tracing::info;

use crate::exec::CommandRunner;

pub const DEFAULT_RELEASE_REPOSITORY: &str = "quay.io/openshift/okd";

pub struct OcReleaseSource<R: CommandRunner> {
    runner: R,
    oc: String,
    repository: String,
}

impl<R: CommandRunner> OcReleaseSource<R> {
    pub fn new(runner: R, oc: &str, repository: &str) -> Self {
        Self {
            runner,
            oc: oc.to_string(),
            repository: repository.trim_end_matches('/').to_string(),
        }
    }

    /// Release image for a release identifier.
    ///
    /// Identifiers that already name an image (contain `/`) are used as is.
    pub fn release_image(&self, release: &str) -> String {
        if release.contains('/') {
            release.to_string()
        } else {
            format!("{}:{}", self.repository, release)
        }
    }

    pub fn info_args(&self, release: &str) -> Vec<String> {
        vec![
            "adm".into(),
            "release".into(),
            "info".into(),
            self.release_image(release),
            "--pullspecs".into(),
            "-o".into(),
            "json".into(),
        ]
    }
}

#[async_trait]
impl<R: CommandRunner> ReleaseSource for OcReleaseSource<R> {
    async fn release_info(&self, release: &str) -> Result<String> {
        let args = self.info_args(release);
        info!("Running {} {}", self.oc, args.join(" "));

        let output = self
            .runner
            .run(&self.oc, &args)
            .await
            .map_err(|e| Error::resolution(release, e))?;

        if !output.success() {
            return Err(Error::resolution(release, output.failure_reason()));
        }
        Ok(output.stdout)
    }
}
