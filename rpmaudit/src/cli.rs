use clap::Parser;
use rpmaudit_core::{AuditOptions, FailurePolicy, DEFAULT_EXCLUSIONS};
use std::{path::PathBuf, time::Duration};

use crate::{
    oc::DEFAULT_RELEASE_REPOSITORY,
    output::{EXIT_FATAL, EXIT_OK},
    podman::{DEFAULT_ENGINE, DEFAULT_REFERENCE_IMAGE, DEFAULT_REFERENCE_NAME},
};

#[derive(Parser, Debug)]
#[command(name = "rpmaudit")]
#[command(about = "Find RPMs in a release's images that the reference repositories can't provide", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Release to audit (e.g. 4.15.0-0.okd-2024-03-10-010116) or a full release image
    pub release: String,

    /// Repository the release identifier is resolved against
    #[arg(long, env = "RPMAUDIT_RELEASE_REPOSITORY", default_value = DEFAULT_RELEASE_REPOSITORY)]
    pub release_repository: String,

    /// Container engine binary
    #[arg(long, env = "RPMAUDIT_ENGINE", default_value = DEFAULT_ENGINE)]
    pub engine: String,

    /// oc binary
    #[arg(long, env = "RPMAUDIT_OC", default_value = "oc")]
    pub oc: String,

    /// Name of the reference container
    #[arg(long, env = "RPMAUDIT_REFERENCE_NAME", default_value = DEFAULT_REFERENCE_NAME)]
    pub reference_name: String,

    /// Image the reference container is started from
    #[arg(long, env = "RPMAUDIT_REFERENCE_IMAGE", default_value = DEFAULT_REFERENCE_IMAGE)]
    pub reference_image: String,

    /// Additional image to skip (repeatable)
    #[arg(short = 'x', long = "exclude", value_name = "IMAGE")]
    pub exclude: Vec<String>,

    /// Don't skip the built-in exclusion list
    #[arg(long)]
    pub no_default_excludes: bool,

    /// Abort on the first image that can't be audited
    #[arg(long)]
    pub fail_fast: bool,

    /// Number of images audited in parallel
    #[arg(short, long, default_value = "1")]
    pub jobs: usize,

    /// Number of parallel lookups against the reference container
    #[arg(long, default_value = "1")]
    pub query_jobs: usize,

    /// Timeout for each external command (in seconds)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Remove each release image after its package list is taken
    #[arg(long)]
    pub remove_images: bool,

    /// Stop the reference container when done, if this run started it
    #[arg(long)]
    pub stop_reference: bool,

    /// Write the JSON report to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Cli {
    pub fn audit_options(&self) -> AuditOptions {
        let base = if self.no_default_excludes {
            AuditOptions::without_exclusions()
        } else {
            AuditOptions::default()
        };

        AuditOptions {
            failure_policy: if self.fail_fast {
                FailurePolicy::FailFast
            } else {
                FailurePolicy::Isolate
            },
            jobs: self.jobs,
            query_jobs: self.query_jobs,
            ..base
        }
        .exclude(self.exclude.iter().cloned())
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }

    /// Images skipped for this invocation.
    pub fn exclusions(&self) -> Vec<String> {
        let mut images: Vec<String> = if self.no_default_excludes {
            Vec::new()
        } else {
            DEFAULT_EXCLUSIONS.iter().map(|s| s.to_string()).collect()
        };
        images.extend(self.exclude.iter().cloned());
        images.sort();
        images.dedup();
        images
    }
}

/// Exit status for an argument parsing result that stops the program.
///
/// `--help` and `--version` exit cleanly; anything else is a fatal input error.
pub fn parse_exit_code(err: &clap::Error) -> i32 {
    if err.use_stderr() {
        EXIT_FATAL
    } else {
        EXIT_OK
    }
}
