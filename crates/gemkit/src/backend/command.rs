//! Backend that shells out to the distribution's package tools.

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::types::{PackageManager, SystemPackage};
use log::{debug, info};
use std::process::{Command, Output, Stdio};

/// Exit status every supported query tool uses for "no such package".
const NOT_INSTALLED_STATUS: i32 = 1;

/// Backend that executes real package manager commands.
#[derive(Debug, Clone)]
pub struct CommandBackend {
    manager: PackageManager,
    use_sudo: bool,
}

impl CommandBackend {
    /// Create a backend for the given package manager.
    pub fn new(manager: PackageManager) -> Self {
        Self {
            manager,
            use_sudo: false,
        }
    }

    /// Run install commands through `sudo`.
    pub fn with_sudo(mut self, use_sudo: bool) -> Self {
        self.use_sudo = use_sudo;
        self
    }

    /// Whether install commands are run through `sudo`.
    pub fn uses_sudo(&self) -> bool {
        self.use_sudo
    }
}

impl Backend for CommandBackend {
    fn manager(&self) -> PackageManager {
        self.manager
    }

    fn is_available(&self) -> bool {
        let (query, _) = query_command(self.manager, "");
        let (install, _) = install_command(self.manager, "");
        which::which(query).is_ok() && which::which(install).is_ok()
    }

    fn is_installed(&self, package: &SystemPackage) -> Result<bool> {
        let (program, args) = query_command(self.manager, &package.name);
        debug!("Querying {}: {} {}", package, program, args.join(" "));

        let output = Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| Error::QueryFailed {
                package: package.name.clone(),
                message: format!("failed to execute {program}: {e}"),
            })?;

        let installed = interpret_query(self.manager, &package.name, &output)?;
        debug!("{} installed: {}", package, installed);
        Ok(installed)
    }

    fn install(&self, package: &SystemPackage) -> Result<()> {
        let (program, args) = install_command(self.manager, &package.name);

        let mut cmd = if self.use_sudo {
            let mut cmd = Command::new("sudo");
            cmd.arg(program).args(&args);
            cmd
        } else {
            let mut cmd = Command::new(program);
            cmd.args(&args);
            cmd
        };

        if self.manager == PackageManager::Apt {
            cmd.env("DEBIAN_FRONTEND", "noninteractive");
        }

        info!(
            "Running {}{} {}",
            if self.use_sudo { "sudo " } else { "" },
            program,
            args.join(" ")
        );

        // stdout streams to the terminal; stderr is kept for categorization
        let output = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| Error::CommandFailed {
                message: format!("failed to execute {program}: {e}"),
                stderr: String::new(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::from_command_output(program, &stderr, Some(package.name.as_str())));
        }

        Ok(())
    }
}

/// Command used to ask whether `package` is installed.
pub fn query_command(manager: PackageManager, package: &str) -> (&'static str, Vec<String>) {
    let package = package.to_string();
    match manager {
        PackageManager::Apt => (
            "dpkg-query",
            vec!["-W".into(), "-f=${db:Status-Abbrev}".into(), package],
        ),
        PackageManager::Dnf | PackageManager::Yum | PackageManager::Zypper => {
            ("rpm", vec!["-q".into(), package])
        }
        PackageManager::Pacman => ("pacman", vec!["-Q".into(), package]),
        PackageManager::Apk => ("apk", vec!["info".into(), "-e".into(), package]),
    }
}

/// Non-interactive command that installs `package`.
pub fn install_command(manager: PackageManager, package: &str) -> (&'static str, Vec<String>) {
    let package = package.to_string();
    match manager {
        PackageManager::Apt => (
            "apt-get",
            vec!["-q".into(), "-y".into(), "install".into(), package],
        ),
        PackageManager::Dnf => ("dnf", vec!["-y".into(), "install".into(), package]),
        PackageManager::Yum => ("yum", vec!["-y".into(), "install".into(), package]),
        PackageManager::Pacman => (
            "pacman",
            vec!["-S".into(), "--noconfirm".into(), "--needed".into(), package],
        ),
        PackageManager::Zypper => (
            "zypper",
            vec!["--non-interactive".into(), "install".into(), package],
        ),
        PackageManager::Apk => ("apk", vec!["add".into(), package]),
    }
}

/// Turn a finished query command into an installed/not-installed answer.
fn interpret_query(manager: PackageManager, package: &str, output: &Output) -> Result<bool> {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    interpret_query_status(manager, package, output.status.code(), &stdout, &stderr)
}

fn interpret_query_status(
    manager: PackageManager,
    package: &str,
    code: Option<i32>,
    stdout: &str,
    stderr: &str,
) -> Result<bool> {
    match code {
        Some(0) => match manager {
            // Status-Abbrev is "<desired><status><error>", e.g. "ii " or "rc ".
            // Only a current status of 'i' means the files are installed.
            PackageManager::Apt => Ok(stdout.chars().nth(1) == Some('i')),
            _ => Ok(true),
        },
        Some(NOT_INSTALLED_STATUS) => Ok(false),
        Some(code) => Err(Error::QueryFailed {
            package: package.to_string(),
            message: format!("exited with status {code}: {}", stderr.trim()),
        }),
        None => Err(Error::QueryFailed {
            package: package.to_string(),
            message: "terminated by signal".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_commands() {
        let (program, args) = query_command(PackageManager::Apt, "ruby-rake");
        assert_eq!(program, "dpkg-query");
        assert_eq!(args, vec!["-W", "-f=${db:Status-Abbrev}", "ruby-rake"]);

        let (program, args) = query_command(PackageManager::Dnf, "rubygem-rake");
        assert_eq!(program, "rpm");
        assert_eq!(args, vec!["-q", "rubygem-rake"]);

        let (program, _) = query_command(PackageManager::Pacman, "ruby-rake");
        assert_eq!(program, "pacman");

        let (program, args) = query_command(PackageManager::Apk, "ruby-rake");
        assert_eq!(program, "apk");
        assert_eq!(args, vec!["info", "-e", "ruby-rake"]);
    }

    #[test]
    fn test_install_commands() {
        let (program, args) = install_command(PackageManager::Apt, "ruby-nokogiri");
        assert_eq!(program, "apt-get");
        assert_eq!(args, vec!["-q", "-y", "install", "ruby-nokogiri"]);

        let (program, args) = install_command(PackageManager::Zypper, "rubygem-pg");
        assert_eq!(program, "zypper");
        assert_eq!(args, vec!["--non-interactive", "install", "rubygem-pg"]);

        for manager in PackageManager::ALL {
            let (_, args) = install_command(manager, "pkg");
            assert_eq!(args.last().map(String::as_str), Some("pkg"));
        }
    }

    #[test]
    fn test_dpkg_status_installed() {
        assert!(interpret_query_status(PackageManager::Apt, "p", Some(0), "ii ", "").unwrap());
        // held packages are still installed
        assert!(interpret_query_status(PackageManager::Apt, "p", Some(0), "hi ", "").unwrap());
    }

    #[test]
    fn test_dpkg_status_not_installed() {
        // removed but config files remain
        assert!(!interpret_query_status(PackageManager::Apt, "p", Some(0), "rc ", "").unwrap());
        assert!(!interpret_query_status(PackageManager::Apt, "p", Some(0), "un ", "").unwrap());
        assert!(!interpret_query_status(PackageManager::Apt, "p", Some(0), "", "").unwrap());
    }

    #[test]
    fn test_unknown_package_is_not_installed() {
        let stderr = "dpkg-query: no packages found matching ruby-foo";
        assert!(!interpret_query_status(PackageManager::Apt, "ruby-foo", Some(1), "", stderr).unwrap());
        assert!(!interpret_query_status(PackageManager::Dnf, "rubygem-foo", Some(1), "package rubygem-foo is not installed", "").unwrap());
        assert!(!interpret_query_status(PackageManager::Pacman, "ruby-foo", Some(1), "", "error: package 'ruby-foo' was not found").unwrap());
    }

    #[test]
    fn test_rpm_pacman_apk_installed() {
        for manager in [PackageManager::Dnf, PackageManager::Pacman, PackageManager::Apk] {
            assert!(interpret_query_status(manager, "p", Some(0), "p 1.0", "").unwrap());
        }
    }

    #[test]
    fn test_query_failure_is_not_absence() {
        let err = interpret_query_status(
            PackageManager::Apt,
            "ruby-foo",
            Some(2),
            "",
            "dpkg-query: error: parsing file '/var/lib/dpkg/status'",
        )
        .unwrap_err();
        assert!(matches!(err, Error::QueryFailed { ref package, .. } if package == "ruby-foo"));

        let err = interpret_query_status(PackageManager::Apt, "ruby-foo", None, "", "").unwrap_err();
        assert!(matches!(err, Error::QueryFailed { .. }));
    }

    #[test]
    fn test_backend_builder() {
        let backend = CommandBackend::new(PackageManager::Apt);
        assert_eq!(backend.manager(), PackageManager::Apt);
        assert!(!backend.uses_sudo());
        assert!(backend.with_sudo(true).uses_sudo());
    }
}
