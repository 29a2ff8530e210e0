//! rpmaudit: command-line shell around `rpmaudit-core`
//!
//! Provides the concrete collaborators that drive `oc` and the container
//! engine, the command-line definition, and report output.

pub mod cli;
pub mod exec;
pub mod oc;
pub mod output;
pub mod podman;
pub mod progress;

pub use cli::Cli;
pub use exec::{CommandOutput, CommandRunner, ExecError, ProcessRunner};
pub use oc::OcReleaseSource;
pub use podman::{PodmanInventory, PodmanReference};
pub use progress::ProgressDisplay;
