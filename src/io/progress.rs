//! Progress display over the cells left to reveal

use crate::io::configuration::PROGRESS_BAR_WIDTH;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::LazyLock;
use std::time::Duration;

static STEP_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template(&format!(
            "[{{elapsed_precise}}] {{prefix}} [{{bar:{PROGRESS_BAR_WIDTH}.cyan/blue}}] {{pos}}/{{len}} {{msg}}"
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ")
});

/// Progress of one explanation run
///
/// The bar length is the number of cells revealed by the run, its position
/// the number of steps committed so far.
pub struct ProgressManager {
    bar: ProgressBar,
    offset: usize,
}

impl Default for ProgressManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressManager {
    /// Create a progress manager with an empty bar
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(STEP_STYLE.clone());
        Self { bar, offset: 0 }
    }

    /// Size the bar for a run
    ///
    /// `known` cells are already revealed when the run starts and do not
    /// count towards the bar.
    pub fn initialize(&mut self, method: &str, known: usize, total: usize) {
        self.offset = known;
        self.bar.set_prefix(method.to_string());
        self.bar.set_length(total.saturating_sub(known) as u64);
        self.bar.set_position(0);
    }

    /// Report the number of revealed cells after a step
    pub fn update_step(&self, step_nr: usize, revealed: usize, elapsed: Duration) {
        self.bar
            .set_position(revealed.saturating_sub(self.offset) as u64);
        self.bar.set_message(format!(
            "step {step_nr} ({:.1}s)",
            elapsed.as_secs_f64()
        ));
    }

    /// Current bar position
    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    /// Bar length
    pub fn length(&self) -> u64 {
        self.bar.length().unwrap_or(0)
    }

    /// Close the bar with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}
