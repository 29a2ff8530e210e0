//! Container engine collaborators
//!
//! Both collaborators shell out to a podman compatible engine. The reference
//! environment is a named long-lived container; inventories come from
//! disposable `--rm` runs of each release image.

use async_trait::async_trait;
use rpmaudit_core::{Error, InventorySource, ReferenceEnvironment, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

use crate::exec::{CommandOutput, CommandRunner};

pub const DEFAULT_ENGINE: &str = "podman";
pub const DEFAULT_REFERENCE_NAME: &str = "ubi";
pub const DEFAULT_REFERENCE_IMAGE: &str = "registry.access.redhat.com/ubi9/ubi";

/// Package names one per line.
const RPM_QUERY_FORMAT: &str = "%{NAME}\n";

fn args(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Marker dnf prints when no package provides the requested name.
const NO_MATCH_MARKER: &str = "no matches found";

/// Interpret the result of `dnf provides`.
///
/// dnf exits 1 both when nothing matches and when it cannot load its
/// repositories, so exit 1 only counts as an answer when the no-match
/// marker was printed. Everything else is a failed query.
pub fn classify_provides(package: &str, output: &CommandOutput) -> Result<bool> {
    match output.code {
        Some(0) => Ok(true),
        Some(1) if reports_no_match(output) => Ok(false),
        _ => Err(Error::query(package, output.failure_reason())),
    }
}

fn reports_no_match(output: &CommandOutput) -> bool {
    [&output.stderr, &output.stdout]
        .iter()
        .any(|text| text.to_lowercase().contains(NO_MATCH_MARKER))
}

/// State of the named reference container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    Missing,
    Stopped,
    Running,
}

impl ContainerState {
    /// Parse the result of `container inspect --format {{.State.Running}}`.
    pub fn from_inspect(output: &CommandOutput) -> Self {
        if !output.success() {
            ContainerState::Missing
        } else if output.stdout.trim() == "true" {
            ContainerState::Running
        } else {
            ContainerState::Stopped
        }
    }
}

pub struct PodmanReference<R: CommandRunner> {
    runner: R,
    engine: String,
    name: String,
    image: String,
    activated: AtomicBool,
}

impl<R: CommandRunner> PodmanReference<R> {
    pub fn new(runner: R, engine: &str, name: &str, image: &str) -> Self {
        Self {
            runner,
            engine: engine.to_string(),
            name: name.to_string(),
            image: image.to_string(),
            activated: AtomicBool::new(false),
        }
    }

    /// Whether this instance started or restarted the container.
    pub fn activated(&self) -> bool {
        self.activated.load(Ordering::SeqCst)
    }

    pub fn inspect_args(&self) -> Vec<String> {
        args(&["container", "inspect", "--format", "{{.State.Running}}", self.name.as_str()])
    }

    pub fn run_args(&self) -> Vec<String> {
        args(&[
            "run",
            format!("--name={}", self.name).as_str(),
            "--rm",
            "-d",
            "--security-opt=label=disable",
            "--entrypoint=bash",
            "-i",
            self.image.as_str(),
            "-c",
            "sleep infinity",
        ])
    }

    pub fn start_args(&self) -> Vec<String> {
        args(&["start", self.name.as_str()])
    }

    pub fn refresh_args(&self) -> Vec<String> {
        args(&["exec", self.name.as_str(), "dnf", "check-update"])
    }

    pub fn provides_args(&self, package: &str) -> Vec<String> {
        args(&["exec", self.name.as_str(), "dnf", "provides", package])
    }

    pub fn stop_args(&self) -> Vec<String> {
        args(&["stop", self.name.as_str()])
    }

    pub async fn state(&self) -> Result<ContainerState> {
        let output = self.run(&self.inspect_args()).await?;
        Ok(ContainerState::from_inspect(&output))
    }

    async fn run(&self, args: &[String]) -> Result<CommandOutput> {
        self.runner
            .run(&self.engine, args)
            .await
            .map_err(|e| Error::ReferenceEnvironment(e.to_string()))
    }

    async fn run_checked(&self, args: &[String], action: &str) -> Result<()> {
        let output = self.run(args).await?;
        if !output.success() {
            return Err(Error::ReferenceEnvironment(format!(
                "failed to {} {}: {}",
                action,
                self.name,
                output.failure_reason()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl<R: CommandRunner> ReferenceEnvironment for PodmanReference<R> {
    async fn is_active(&self) -> Result<bool> {
        Ok(self.state().await? == ContainerState::Running)
    }

    async fn activate(&self) -> Result<()> {
        match self.state().await? {
            ContainerState::Running => debug!("{} container already running", self.name),
            ContainerState::Stopped => {
                info!("Restarting stopped {} container", self.name);
                self.run_checked(&self.start_args(), "start").await?;
                self.activated.store(true, Ordering::SeqCst);
            }
            ContainerState::Missing => {
                info!("Starting {} container from {}", self.name, self.image);
                self.run_checked(&self.run_args(), "start").await?;
                self.activated.store(true, Ordering::SeqCst);
            }
        }

        // check-update exits 100 when updates are available
        let output = self.run(&self.refresh_args()).await?;
        match output.code {
            Some(0) | Some(100) => {
                debug!("Repositories refreshed in {}", self.name);
                Ok(())
            }
            _ => Err(Error::ReferenceEnvironment(format!(
                "failed to refresh repositories in {}: {}",
                self.name,
                output.failure_reason()
            ))),
        }
    }

    async fn query_provides(&self, package: &str) -> Result<bool> {
        let output = self
            .runner
            .run(&self.engine, &self.provides_args(package))
            .await
            .map_err(|e| Error::query(package, e))?;
        classify_provides(package, &output)
    }

    async fn deactivate(&self) -> Result<()> {
        info!("Stopping {} container", self.name);
        self.run_checked(&self.stop_args(), "stop").await
    }
}

pub struct PodmanInventory<R: CommandRunner> {
    runner: R,
    engine: String,
    remove_images: bool,
}

impl<R: CommandRunner> PodmanInventory<R> {
    pub fn new(runner: R, engine: &str) -> Self {
        Self {
            runner,
            engine: engine.to_string(),
            remove_images: false,
        }
    }

    /// Remove each image from local storage once its inventory is taken.
    pub fn remove_images(mut self, remove: bool) -> Self {
        self.remove_images = remove;
        self
    }

    pub fn query_args(&self, pull_ref: &str) -> Vec<String> {
        args(&[
            "run",
            "--rm",
            "--security-opt=label=disable",
            "--entrypoint=rpm",
            pull_ref,
            "--queryformat",
            RPM_QUERY_FORMAT,
            "-qa",
        ])
    }

    pub fn remove_args(&self, pull_ref: &str) -> Vec<String> {
        args(&["rmi", "-f", pull_ref])
    }

    async fn remove_image(&self, pull_ref: &str) {
        match self.runner.run(&self.engine, &self.remove_args(pull_ref)).await {
            Ok(output) if output.success() => debug!("Removed {}", pull_ref),
            Ok(output) => warn!("Failed to remove {}: {}", pull_ref, output.failure_reason()),
            Err(e) => warn!("Failed to remove {}: {}", pull_ref, e),
        }
    }
}

#[async_trait]
impl<R: CommandRunner> InventorySource for PodmanInventory<R> {
    async fn installed_packages(&self, pull_ref: &str) -> Result<String> {
        let result = self
            .runner
            .run(&self.engine, &self.query_args(pull_ref))
            .await;

        if self.remove_images {
            self.remove_image(pull_ref).await;
        }

        let output = result.map_err(|e| Error::extraction(pull_ref, e))?;
        if !output.success() {
            return Err(Error::extraction(pull_ref, output.failure_reason()));
        }
        Ok(output.stdout)
    }
}
