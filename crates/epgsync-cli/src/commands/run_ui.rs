use epgsync_core::{RunObserver, RunStage};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::time::Duration;

/// Spinner for run stages; falls back to structured logs off a terminal.
pub struct RunUI {
    spinner: ProgressBar,
    interactive: bool,
}

impl RunUI {
    pub fn new(quiet: bool) -> Self {
        let interactive = is_interactive() && !quiet;

        let spinner = if interactive {
            let spinner = ProgressBar::new_spinner();
            let style = ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
            spinner.set_style(style);
            spinner
        } else {
            tracing::debug!(
                operation = "ui_init",
                mode = "non_interactive",
                "Running in non-interactive mode - spinner disabled, using structured logging"
            );
            ProgressBar::hidden()
        };

        Self { spinner, interactive }
    }

    pub fn finish(&self) {
        if self.interactive {
            self.spinner.finish_and_clear();
        }
    }
}

impl RunObserver for RunUI {
    fn stage_started(&self, stage: RunStage) {
        if !self.interactive {
            tracing::info!(operation = "progress", stage = ?stage, "{}", stage.label());
            return;
        }

        if stage == RunStage::GeneratingGuide {
            // The grabber writes its own progress to the terminal
            self.spinner.disable_steady_tick();
            self.spinner.println(format!("{}...", stage.label()));
            self.spinner.set_message(format!("{}...", stage.label()));
            return;
        }

        self.spinner.set_message(format!("{}...", stage.label()));
        self.spinner.enable_steady_tick(Duration::from_millis(100));
    }

    fn stage_finished(&self, stage: RunStage, summary: &str) {
        if self.interactive {
            self.spinner.println(format!("  • {}: {}", stage.label(), summary));
        } else {
            tracing::info!(operation = "progress", stage = ?stage, summary, "{} done", stage.label());
        }
    }
}

impl Drop for RunUI {
    fn drop(&mut self) {
        self.finish();
    }
}

pub fn is_interactive() -> bool {
    std::io::stdout().is_terminal() && std::io::stderr().is_terminal()
}
