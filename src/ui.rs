use colored::{ColoredString, Colorize};

/// Kind of a one-line status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Info,
    Success,
    Warn,
    Error,
}

impl Status {
    fn glyph(self) -> ColoredString {
        match self {
            Status::Info => "ℹ".blue(),
            Status::Success => "✓".green(),
            Status::Warn => "⚠".yellow(),
            Status::Error => "✗".red(),
        }
    }
}

fn status_line(status: Status, msg: &str) -> String {
    format!("{} {msg}", status.glyph())
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{}", status_line(Status::Info, msg));
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{}", status_line(Status::Success, msg));
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{}", status_line(Status::Warn, msg));
}

/// Print an error message to stderr
pub fn error(msg: &str) {
    eprintln!("{}", status_line(Status::Error, msg));
}

/// Print an indented, muted line (advice, skipped packages)
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a title underlined to its display width
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", rule(title).dimmed());
}

fn rule(title: &str) -> String {
    "─".repeat(title.chars().count())
}

/// Print one `key: value` line of a run description
pub fn kv(key: &str, value: &str) {
    println!("  {}: {value}", key.dimmed());
}

/// Pluralize a noun for a count ("1 package", "2 packages").
pub fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}
