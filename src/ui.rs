//! Terminal progress bars for the long-running stages

use indicatif::{ProgressBar, ProgressStyle};
use pathgen_core::Progress;

const BAR_TEMPLATE: &str = "{prefix:>10} [{bar:40}] {pos}/{len} ({eta})";
const SPINNER_TEMPLATE: &str = "{prefix:>10} {spinner} {pos}";

/// Hands out one bar per stage, or hidden bars when progress is disabled.
pub struct Ui {
    enabled: bool,
}

impl Ui {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn stage(&self, name: &'static str) -> StageBar {
        let pb = if self.enabled {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::hidden()
        };
        pb.set_style(spinner_style());
        pb.set_prefix(name);
        StageBar { pb }
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template(BAR_TEMPLATE)
        .expect("bar template is valid")
        .progress_chars("=> ")
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template(SPINNER_TEMPLATE)
        .expect("spinner template is valid")
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
}

/// A single stage's bar. A known total draws a bar, otherwise a spinner.
pub struct StageBar {
    pb: ProgressBar,
}

impl Progress for StageBar {
    fn set_total(&self, total: Option<u64>) {
        match total {
            Some(len) => {
                self.pb.set_style(bar_style());
                self.pb.set_length(len);
            }
            None => self.pb.set_style(spinner_style()),
        }
    }

    fn advance(&self, delta: u64) {
        self.pb.inc(delta);
    }

    fn finish(&self) {
        self.pb.finish_and_clear();
    }
}
