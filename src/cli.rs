use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use gemkit::PackageManager;
use gemkit::manifest::DEFAULT_MANIFEST;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gemsync")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Install the gems a Gemfile declares through the system package manager", long_about = None)]
#[command(propagate_version = true)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Command>,

    /// Arguments for the default `sync` command
    #[command(flatten)]
    pub sync: SyncArgs,
}

impl Cli {
    /// The command to run; no subcommand means `sync`.
    pub fn into_command(self) -> Command {
        self.command.unwrap_or(Command::Sync(self.sync))
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Install every declared gem that is not yet installed (default)
    Sync(SyncArgs),

    /// Show the installed state of every declared gem without installing
    Status(StatusArgs),

    /// Show how each Gemfile line is classified
    Lines(LinesArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Shared arguments
// ============================================================================

#[derive(Args, Clone)]
pub struct ManifestArgs {
    /// Path to the Gemfile, or a directory containing one
    #[arg(short, long, env = "GEMSYNC_FILE", default_value = DEFAULT_MANIFEST)]
    pub file: PathBuf,
}

#[derive(Args, Clone)]
pub struct BackendArgs {
    /// Package manager to use (detected from /etc/os-release by default)
    #[arg(short, long, value_enum, env = "GEMSYNC_MANAGER")]
    pub manager: Option<ManagerArg>,

    /// Prefix prepended to gem names to form package names (e.g. "ruby-")
    #[arg(short, long, env = "GEMSYNC_PREFIX")]
    pub prefix: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ManagerArg {
    Apt,
    Dnf,
    Yum,
    Pacman,
    Zypper,
    Apk,
}

impl From<ManagerArg> for PackageManager {
    fn from(arg: ManagerArg) -> Self {
        match arg {
            ManagerArg::Apt => Self::Apt,
            ManagerArg::Dnf => Self::Dnf,
            ManagerArg::Yum => Self::Yum,
            ManagerArg::Pacman => Self::Pacman,
            ManagerArg::Zypper => Self::Zypper,
            ManagerArg::Apk => Self::Apk,
        }
    }
}

// ============================================================================
// Commands
// ============================================================================

#[derive(Args, Clone)]
pub struct SyncArgs {
    #[command(flatten)]
    pub manifest: ManifestArgs,

    #[command(flatten)]
    pub backend: BackendArgs,

    /// Show what would be installed without installing
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Run install commands through sudo
    #[arg(long)]
    pub sudo: bool,

    /// Install attempts per package; network and lock errors are retried
    #[arg(short, long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..=10))]
    pub retries: u32,

    /// Ask before installing each package
    #[arg(short, long)]
    pub interactive: bool,
}

#[derive(Args, Clone)]
pub struct StatusArgs {
    #[command(flatten)]
    pub manifest: ManifestArgs,

    #[command(flatten)]
    pub backend: BackendArgs,
}

#[derive(Args, Clone)]
pub struct LinesArgs {
    #[command(flatten)]
    pub manifest: ManifestArgs,

    /// Print the classification as JSON
    #[arg(long)]
    pub json: bool,
}
