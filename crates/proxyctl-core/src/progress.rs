use crate::engine::ValidationReport;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

/// Consumer of validation progress.
///
/// Called only from the engine's consumer loop, never from workers.
pub trait ProgressReporter {
    fn on_start(&mut self, _total: usize) {}

    fn on_tick(&mut self, done: usize, total: usize);

    fn on_finish(&mut self, _report: &ValidationReport) {}
}

/// Discards progress
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn on_tick(&mut self, _done: usize, _total: usize) {}
}

/// Single-line console counter
#[derive(Default)]
pub struct ConsoleProgress {
    bar: Option<ProgressBar>,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Standard progress bar used for validation runs
pub fn create_progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template("Progress: [{pos}/{len}] {percent}% [{bar:40.cyan/blue}] {elapsed_precise}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb
}

impl ProgressReporter for ConsoleProgress {
    fn on_start(&mut self, total: usize) {
        self.bar = Some(create_progress_bar(total as u64));
    }

    fn on_tick(&mut self, done: usize, _total: usize) {
        if let Some(bar) = &self.bar {
            bar.set_position(done as u64);
        }
    }

    fn on_finish(&mut self, report: &ValidationReport) {
        if let Some(bar) = self.bar.take() {
            bar.set_position(report.processed as u64);
            bar.finish();
        }
        println!(
            "{} {} {}",
            "Validation completed. Found".green().bold(),
            report.valid.len().to_string().yellow().bold(),
            "valid proxies.".green().bold()
        );
    }
}
