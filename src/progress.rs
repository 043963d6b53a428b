//! Spinners for the gemsync CLI.
//!
//! Spinners draw to stderr and hide themselves when it is not a terminal,
//! so piped output stays clean.

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const TICK_STRINGS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", " "];

/// Start a spinner with a message.
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(TICK_STRINGS);
    pb.set_style(style);
    pb.set_message(msg.to_owned());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn finish_plain(pb: &ProgressBar, msg: String) {
    pb.set_style(ProgressStyle::with_template("{msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()));
    pb.finish_with_message(msg);
}

/// Finish a spinner with a success mark.
pub fn finish_success(pb: &ProgressBar, msg: &str) {
    finish_plain(pb, format!("{} {}", "✓".green(), msg));
}

/// Finish a spinner with a failure mark.
pub fn finish_error(pb: &ProgressBar, msg: &str) {
    finish_plain(pb, format!("{} {}", "✗".red(), msg));
}
