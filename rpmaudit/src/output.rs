//! Report output and exit status

use colored::Colorize;
use rpmaudit_core::DifferentialReport;
use std::{
    fs,
    io::{self, Write},
    path::Path,
};

/// Every image was audited.
pub const EXIT_OK: i32 = 0;
/// The run aborted and no report was written.
pub const EXIT_FATAL: i32 = 1;
/// A report was written but some images could not be audited.
///
/// Kept apart from 2, which argument parsing uses for usage errors.
pub const EXIT_PARTIAL: i32 = 3;

/// Write the report as JSON to `path`, or to stdout when no path is given.
pub fn write_report(report: &DifferentialReport, path: Option<&Path>) -> io::Result<()> {
    let json = report.to_json().map_err(io::Error::other)?;
    match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, format!("{}\n", json))
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}", json)?;
            stdout.flush()
        }
    }
}

pub fn exit_code(report: &DifferentialReport) -> i32 {
    if report.has_failures() {
        EXIT_PARTIAL
    } else {
        EXIT_OK
    }
}

pub fn summary(report: &DifferentialReport) -> String {
    let mut lines = vec![
        format!(
            "[{}] {} images audited",
            "+".bright_blue().bold(),
            report.audited_images()
        ),
        format!(
            "[{}] {} packages not available from the reference repositories",
            "+".bright_blue().bold(),
            report.total_missing()
        ),
    ];
    if report.has_failures() {
        lines.push(format!(
            "[{}] {} images could not be audited: {}",
            "〤".bright_red().bold(),
            report.failed.len(),
            report.failed.keys().cloned().collect::<Vec<_>>().join(", ")
        ));
    }
    lines.join("\n")
}
