mod cli;
mod commands;
mod progress;
mod sudo;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;
use std::process::ExitCode;

/// Exit status when the manifest is missing (EX_NOINPUT).
const EXIT_NO_MANIFEST: u8 = 66;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    match run(&ctx, cli.into_command()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ui::error(&format!("{e:#}"));
            ExitCode::from(exit_code(&e))
        }
    }
}

fn run(ctx: &Context, command: Command) -> Result<()> {
    match command {
        Command::Sync(args) => commands::sync::run(ctx, &args),
        Command::Status(args) => commands::status::run(ctx, &args),
        Command::Lines(args) => commands::lines::run(ctx, &args),
        Command::Completions { shell } => {
            generate(shell, &mut Cli::command(), "gemsync", &mut io::stdout());
            Ok(())
        }
    }
}

/// Map a fatal error onto the process exit status.
fn exit_code(error: &anyhow::Error) -> u8 {
    let missing_manifest = error
        .chain()
        .find_map(|cause| cause.downcast_ref::<gemkit::Error>())
        .is_some_and(|e| matches!(e, gemkit::Error::ManifestNotFound(_)));

    if missing_manifest { EXIT_NO_MANIFEST } else { 1 }
}
