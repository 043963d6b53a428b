//! `gemsync sync`: install every declared gem that is missing.

use super::{build_client, load_manifest, manifest_label};
use crate::Context;
use crate::cli::SyncArgs;
use crate::{sudo, ui};
use anyhow::{Result, bail};
use colored::Colorize;
use gemkit::SystemPackage;
use gemkit::reconcile::{
    AutoConfirm, ConfirmCallback, LineReport, Outcome, ReconcileObserver, ReconcileOptions,
    ReconcileReport,
};
use log::warn;

pub fn run(ctx: &Context, args: &SyncArgs) -> Result<()> {
    // A missing manifest aborts before any package manager is touched.
    let manifest = load_manifest(&args.manifest.file)?;
    let client = build_client(ctx, &args.backend, args.sudo, args.retries)?;

    if args.interactive && !console::user_attended() {
        bail!("--interactive needs a terminal on stdout");
    }

    if !ctx.quiet {
        ui::header(if args.dry_run { "Gemfile Sync (dry run)" } else { "Gemfile Sync" });
        ui::kv("Manifest", &manifest_label(&manifest));
        ui::kv("Manager", client.manager().name());
        ui::kv("Prefix", &format!("{:?}", client.naming().prefix));
        println!();
    }

    if sudo::needs_privileges(args.sudo, args.dry_run) {
        ui::warn("Not running as root; installs will likely be refused. Use --sudo or run as root.");
    }

    let options = ReconcileOptions {
        dry_run: args.dry_run,
    };
    let mut observer = ConsoleObserver { quiet: ctx.quiet };
    let reconciler = client.reconciler(options);

    let report = if args.interactive {
        reconciler.run(&manifest, &mut observer, &mut PromptConfirm)
    } else {
        reconciler.run(&manifest, &mut observer, &mut AutoConfirm)
    };

    if !ctx.quiet {
        print_summary(&report, args.dry_run);
    }

    // Per-line problems were reported as they happened; the run itself succeeded.
    Ok(())
}

/// Prints each line's outcome as soon as it is known.
struct ConsoleObserver {
    quiet: bool,
}

impl ReconcileObserver for ConsoleObserver {
    fn on_install_start(&mut self, package: &SystemPackage) {
        if !self.quiet {
            ui::info(&format!("Installing {package}..."));
        }
    }

    fn on_line_complete(&mut self, report: &LineReport) {
        let Some(msg) = outcome_message(report) else {
            return;
        };

        match &report.outcome {
            Outcome::InstallFailed(_, e) | Outcome::QueryFailed(_, e) => {
                ui::error(&msg);
                ui::dim(e.category().advice());
            }
            Outcome::Malformed(_) => ui::warn(&msg),
            _ if self.quiet => {}
            Outcome::Installed(_) => ui::success(&msg),
            Outcome::WouldInstall(_) => ui::info(&msg),
            _ => ui::dim(&msg),
        }
    }
}

/// The line printed for an outcome; `None` for ignored lines.
fn outcome_message(report: &LineReport) -> Option<String> {
    let msg = match &report.outcome {
        Outcome::Ignored => return None,
        Outcome::AlreadyInstalled(p) => format!("Package {p} is already installed."),
        Outcome::Installed(p) => format!("Installed {p}"),
        Outcome::WouldInstall(p) => format!("Would install {p}"),
        Outcome::Declined(p) => format!("Skipped {p}"),
        Outcome::InstallFailed(p, e) => format!("Failed to install {p}: {e}"),
        Outcome::QueryFailed(p, e) => {
            format!("Could not determine whether {p} is installed, not installing: {e}")
        }
        Outcome::Malformed(raw) => format!(
            "Unable to determine gem name from line {}: {}",
            report.line,
            raw.trim_end()
        ),
    };
    Some(msg)
}

/// Asks on the terminal before each install.
struct PromptConfirm;

impl ConfirmCallback for PromptConfirm {
    fn confirm(&mut self, package: &SystemPackage) -> bool {
        dialoguer::Confirm::new()
            .with_prompt(format!("Install {package}?"))
            .default(true)
            .interact()
            .unwrap_or_else(|e| {
                warn!("Failed to read confirmation for {package}: {e}");
                false
            })
    }
}

fn print_summary(report: &ReconcileReport, dry_run: bool) {
    let failed = report.install_failures() + report.query_failures();

    println!();
    println!("{}", "─".repeat(50).dimmed());
    if dry_run {
        println!(
            "  {} to install, {} already installed, {} failed",
            report.would_install().to_string().yellow(),
            report.already_installed().to_string().dimmed(),
            colored_failures(failed),
        );
    } else {
        println!(
            "  {} installed, {} already installed, {} skipped, {} failed",
            report.installed().to_string().green(),
            report.already_installed().to_string().dimmed(),
            report.declined().to_string().dimmed(),
            colored_failures(failed),
        );
    }
    if report.malformed() > 0 {
        println!(
            "  {} could not be parsed",
            ui::plural(report.malformed(), "line").yellow()
        );
    }

    if !report.has_problems() {
        println!();
        if report.declarations() == 0 {
            ui::info("No gems declared.");
        } else if dry_run {
            ui::success("Dry run complete.");
        } else {
            ui::success("Gemfile sync complete!");
        }
    }
}

fn colored_failures(count: usize) -> colored::ColoredString {
    if count == 0 {
        count.to_string().dimmed()
    } else {
        count.to_string().red()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gemkit::{DeclarationLine, NamingConvention, PackageName};

    fn package(name: &str) -> SystemPackage {
        NamingConvention::default().system_package(&PackageName::new(name).unwrap())
    }

    fn line(line: usize, outcome: Outcome) -> LineReport {
        LineReport {
            line,
            declaration: DeclarationLine::Blank,
            outcome,
        }
    }

    #[test]
    fn test_already_installed_message() {
        let report = line(3, Outcome::AlreadyInstalled(package("json")));
        assert_eq!(
            outcome_message(&report).unwrap(),
            "Package ruby-json is already installed."
        );
    }

    #[test]
    fn test_malformed_message_names_line() {
        let report = line(7, Outcome::Malformed("gem 'rails', '~> 7.0'".to_string()));
        assert_eq!(
            outcome_message(&report).unwrap(),
            "Unable to determine gem name from line 7: gem 'rails', '~> 7.0'"
        );
    }

    #[test]
    fn test_failure_messages_include_error() {
        let err = gemkit::Error::NotFound {
            name: "ruby-nokogiri".to_string(),
        };
        let report = line(2, Outcome::InstallFailed(package("nokogiri"), err));
        let msg = outcome_message(&report).unwrap();
        assert!(msg.starts_with("Failed to install ruby-nokogiri"));
        assert!(msg.contains("package not found"));
    }

    #[test]
    fn test_ignored_lines_print_nothing() {
        assert!(outcome_message(&line(1, Outcome::Ignored)).is_none());
    }
}
