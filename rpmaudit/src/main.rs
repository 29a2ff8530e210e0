//! rpmaudit CLI
//!
//! Audits the images of a release against the reference container and
//! prints the packages each image has that the reference can't provide.

use clap::Parser;
use tracing::{error, info, level_filters::LevelFilter, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use rpmaudit::{
    cli::parse_exit_code,
    output::{exit_code, summary, write_report, EXIT_FATAL},
    progress::ProgressWriter,
    Cli, OcReleaseSource, PodmanInventory, PodmanReference, ProcessRunner, ProgressDisplay,
};
use rpmaudit_core::{Auditor, Error, ReferenceEnvironment, Result};

fn setup_logging(level: &str, writer: ProgressWriter) {
    let level = match level.to_lowercase().as_str() {
        "error" => Level::ERROR,
        "warn" => Level::WARN,
        "info" => Level::INFO,
        "debug" => Level::DEBUG,
        "trace" => Level::TRACE,
        _ => Level::INFO,
    };

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .with_env_var("RPMAUDIT_LOG")
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(move || writer.clone())
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Fail early when a required binary is not on PATH.
fn preflight(cli: &Cli) -> Result<()> {
    for program in [&cli.oc, &cli.engine] {
        if which::which(program).is_err() {
            return Err(Error::Input(format!(
                "{} is unavailable. Please install it to continue.",
                program
            )));
        }
    }
    Ok(())
}

async fn run(cli: Cli, progress: &ProgressDisplay) -> Result<i32> {
    preflight(&cli)?;

    let runner = ProcessRunner::new(cli.command_timeout());
    let releases = OcReleaseSource::new(runner.clone(), &cli.oc, &cli.release_repository);
    let inventories =
        PodmanInventory::new(runner.clone(), &cli.engine).remove_images(cli.remove_images);
    let reference = PodmanReference::new(
        runner,
        &cli.engine,
        &cli.reference_name,
        &cli.reference_image,
    );

    info!("Skipping images: {}", cli.exclusions().join(", "));
    let auditor = Auditor::new(&releases, &inventories, &reference, cli.audit_options())
        .with_progress(progress);
    let result = auditor.run(&cli.release).await;
    progress.finish();

    if cli.stop_reference {
        if reference.activated() {
            if let Err(e) = reference.deactivate().await {
                warn!("{}", e);
            }
        } else {
            info!("Leaving {} running, it was not started by this run", cli.reference_name);
        }
    }

    let report = result?;
    write_report(&report, cli.output.as_deref())?;
    if let Some(path) = &cli.output {
        info!("Report written to {}", path.display());
    }
    eprintln!("{}", summary(&report));

    Ok(exit_code(&report))
}

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = parse_exit_code(&e);
            let _ = e.print();
            std::process::exit(code);
        }
    };
    let progress = ProgressDisplay::for_stderr(&cli.log_level);
    setup_logging(&cli.log_level, progress.writer());

    match run(cli, &progress).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("{}", e);
            std::process::exit(EXIT_FATAL);
        }
    }
}
