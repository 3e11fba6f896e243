//! Progress bar rendering for transfer phases.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use picoprog::Phase;

use crate::use_fancy_output;

/// Percentage bar that restarts at every transfer phase.
pub(crate) struct PhaseProgress {
    bar: ProgressBar,
    phase: Option<Phase>,
}

impl PhaseProgress {
    /// Create a bar, hidden in quiet mode or when stderr is not a terminal.
    pub(crate) fn new(quiet: bool) -> Self {
        let bar = if quiet || !use_fancy_output() {
            ProgressBar::hidden()
        } else {
            let bar = ProgressBar::new(100);
            #[allow(clippy::unwrap_used)] // Static template string
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}")
                    .unwrap()
                    .progress_chars("#>-"),
            );
            bar.set_draw_target(ProgressDrawTarget::stderr());
            bar
        };
        Self { bar, phase: None }
    }

    /// Record one completed unit.
    pub(crate) fn update(&mut self, phase: Phase, done: usize, total: usize) {
        if self.phase != Some(phase) {
            self.phase = Some(phase);
            self.bar.reset();
            self.bar.set_message(phase.to_string());
        }
        if total > 0 {
            self.bar.set_position((done * 100 / total) as u64);
        }
    }

    /// Stop drawing and leave `message` on the bar.
    pub(crate) fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    /// Remove the bar after a failure.
    pub(crate) fn abandon(&self) {
        self.bar.abandon();
    }
}
