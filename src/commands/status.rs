//! `gemsync status`: report the installed state of every declared gem.

use super::{build_client, load_manifest, manifest_label};
use crate::Context;
use crate::cli::StatusArgs;
use crate::ui;
use anyhow::Result;
use colored::Colorize;
use gemkit::reconcile::{AutoConfirm, NoObserver, Outcome, ReconcileOptions};

pub fn run(ctx: &Context, args: &StatusArgs) -> Result<()> {
    let manifest = load_manifest(&args.manifest.file)?;
    let client = build_client(ctx, &args.backend, false, 1)?;

    // A dry run only queries, so it doubles as a read-only status check.
    let report = client
        .reconciler(ReconcileOptions { dry_run: true })
        .run(&manifest, &mut NoObserver, &mut AutoConfirm);

    if !ctx.quiet {
        ui::header("Gemfile Status");
        ui::kv("Manifest", &manifest_label(&manifest));
        ui::kv("Manager", client.manager().name());
        println!();
    }

    for line in &report.lines {
        let location = format!("{:>4}", line.line).dimmed();
        match &line.outcome {
            Outcome::Ignored => {}
            Outcome::AlreadyInstalled(p) => {
                println!("{location} {} {}", "✓".green(), p.name);
            }
            Outcome::WouldInstall(p) => {
                println!("{location} {} {} {}", "○".yellow(), p.name, "(missing)".dimmed());
            }
            Outcome::QueryFailed(p, e) => {
                println!("{location} {} {} {}", "?".red(), p.name, format!("({e})").dimmed());
            }
            Outcome::Malformed(raw) => {
                println!("{location} {} {}", "!".yellow(), raw.trim_end().dimmed());
            }
            // Unreachable in a dry run, listed for completeness.
            Outcome::Installed(p) | Outcome::Declined(p) | Outcome::InstallFailed(p, _) => {
                println!("{location}   {}", p.name);
            }
        }
    }

    if !ctx.quiet {
        println!();
        println!(
            "  {} installed, {} missing, {} unknown, {} malformed",
            report.already_installed().to_string().green(),
            report.would_install().to_string().yellow(),
            report.query_failures().to_string().red(),
            report.malformed().to_string().dimmed(),
        );
        if ctx.verbose > 0 && report.would_install() > 0 {
            ui::dim("Run 'gemsync sync' to install the missing packages.");
        }
    }

    Ok(())
}
