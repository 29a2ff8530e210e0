//! Progress bars for audits
//!
//! An outer bar counts audited images; each image in flight gets an inner
//! bar over its package lookups that is cleared once the image is done.
//! Log lines are written through [`ProgressWriter`] so they never tear a bar.

use console::Term;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use rpmaudit_core::AuditProgress;
use std::{
    collections::HashMap,
    io::{self, Write},
    sync::Mutex,
};

/// Bars are drawn only on a terminal, and not when debug output would
/// interleave with every redraw.
pub fn progress_enabled(log_level: &str, is_term: bool) -> bool {
    is_term && !matches!(log_level.to_lowercase().as_str(), "debug" | "trace")
}

fn image_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("[{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-")
}

fn lookup_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("  [{bar:40.green/yellow}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
}

pub struct ProgressDisplay {
    multi: MultiProgress,
    images: ProgressBar,
    lookups: Mutex<HashMap<String, ProgressBar>>,
}

impl ProgressDisplay {
    pub fn new(visible: bool) -> Self {
        let target = if visible {
            ProgressDrawTarget::stderr()
        } else {
            ProgressDrawTarget::hidden()
        };
        let multi = MultiProgress::with_draw_target(target);
        let images = multi.add(ProgressBar::new(0));
        images.set_style(image_style());

        Self {
            multi,
            images,
            lookups: Mutex::new(HashMap::new()),
        }
    }

    /// Display on stderr when it is a terminal and `log_level` allows it.
    pub fn for_stderr(log_level: &str) -> Self {
        Self::new(progress_enabled(log_level, Term::stderr().is_term()))
    }

    pub fn writer(&self) -> ProgressWriter {
        ProgressWriter {
            multi: self.multi.clone(),
        }
    }

    /// Images finished so far.
    pub fn images_done(&self) -> u64 {
        self.images.position()
    }

    /// Lookups done for an image still in flight.
    pub fn lookups_done(&self, image: &str) -> Option<u64> {
        self.lookups
            .lock()
            .ok()
            .and_then(|bars| bars.get(image).map(ProgressBar::position))
    }

    /// Clear every bar.
    pub fn finish(&self) {
        if let Ok(mut bars) = self.lookups.lock() {
            for (_, bar) in bars.drain() {
                bar.finish_and_clear();
                self.multi.remove(&bar);
            }
        }
        self.images.finish_and_clear();
    }

    fn lookup_bar(&self, image: &str) -> Option<ProgressBar> {
        self.lookups.lock().ok()?.get(image).cloned()
    }
}

impl AuditProgress for ProgressDisplay {
    fn images_started(&self, total: usize) {
        self.images.set_length(total as u64);
    }

    fn image_started(&self, image: &str) {
        self.images.set_message(format!("Auditing {}", image));
    }

    fn lookups_started(&self, image: &str, total: usize) {
        let bar = self.multi.add(ProgressBar::new(total as u64));
        bar.set_style(lookup_style());
        bar.set_message(image.to_string());
        if let Ok(mut bars) = self.lookups.lock() {
            bars.insert(image.to_string(), bar);
        }
    }

    fn looking_up(&self, image: &str, package: &str) {
        if let Some(bar) = self.lookup_bar(image) {
            bar.set_message(format!("Looking up {}", package));
        }
    }

    fn looked_up(&self, image: &str, _package: &str) {
        if let Some(bar) = self.lookup_bar(image) {
            bar.inc(1);
        }
    }

    fn image_finished(&self, image: &str) {
        let bar = self.lookups.lock().ok().and_then(|mut bars| bars.remove(image));
        if let Some(bar) = bar {
            bar.finish_and_clear();
            self.multi.remove(&bar);
        }
        self.images.inc(1);
    }
}

/// Stderr writer that hides the bars while a line is written.
#[derive(Clone)]
pub struct ProgressWriter {
    multi: MultiProgress,
}

impl Write for ProgressWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.multi.suspend(|| io::stderr().write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}
