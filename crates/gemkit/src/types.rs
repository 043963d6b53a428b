//! Core types for Gemfile reconciliation.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A gem identifier taken from a `gem <name>` declaration.
///
/// The name is an opaque token: it is never case-folded or normalized, so the
/// identifier used for the installed-state query and the install action is
/// byte-for-byte what the manifest declared.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageName(String);

impl PackageName {
    /// Create a package name, rejecting anything that is not one or more
    /// word characters (`[A-Za-z0-9_]`).
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if is_identifier(&name) {
            Ok(Self(name))
        } else {
            Err(Error::InvalidPackageName(name))
        }
    }

    /// Construct without validation. Callers must have checked the name.
    pub(crate) fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }

    /// The name as declared.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PackageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether `s` is one or more word characters and nothing else.
pub(crate) fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_word_char)
}

/// Word characters as understood by the manifest grammar.
pub(crate) fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Whitespace as understood by the manifest grammar: ASCII only, so a
/// no-break or ideographic space does not separate `gem` from its name.
pub(crate) fn is_separator(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\x0b' | '\x0c' | '\r')
}

/// Supported platform package managers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    /// Debian family (`dpkg-query` / `apt-get`)
    Apt,
    /// Fedora and newer RHEL (`rpm` / `dnf`)
    Dnf,
    /// Older RHEL and CentOS (`rpm` / `yum`)
    Yum,
    /// Arch family (`pacman`)
    Pacman,
    /// openSUSE and SLES (`rpm` / `zypper`)
    Zypper,
    /// Alpine (`apk`)
    Apk,
}

impl PackageManager {
    /// All known package managers.
    pub const ALL: [PackageManager; 6] = [
        PackageManager::Apt,
        PackageManager::Dnf,
        PackageManager::Yum,
        PackageManager::Pacman,
        PackageManager::Zypper,
        PackageManager::Apk,
    ];

    /// Short name used on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            PackageManager::Apt => "apt",
            PackageManager::Dnf => "dnf",
            PackageManager::Yum => "yum",
            PackageManager::Pacman => "pacman",
            PackageManager::Zypper => "zypper",
            PackageManager::Apk => "apk",
        }
    }

    /// Parse a package manager from its short name.
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "apt" | "apt-get" | "dpkg" => Some(PackageManager::Apt),
            "dnf" => Some(PackageManager::Dnf),
            "yum" => Some(PackageManager::Yum),
            "pacman" => Some(PackageManager::Pacman),
            "zypper" => Some(PackageManager::Zypper),
            "apk" => Some(PackageManager::Apk),
            _ => None,
        }
    }

    /// Prefix the distribution uses for packaged Ruby gems.
    pub fn default_prefix(&self) -> &'static str {
        match self {
            PackageManager::Apt | PackageManager::Pacman | PackageManager::Apk => "ruby-",
            PackageManager::Dnf | PackageManager::Yum | PackageManager::Zypper => "rubygem-",
        }
    }
}

impl std::fmt::Display for PackageManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Maps gem names to system package names (`prefix + name`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamingConvention {
    /// Prefix concatenated in front of every gem name
    pub prefix: String,
}

impl NamingConvention {
    /// Create a convention with a custom prefix.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// The convention a package manager uses by default.
    pub fn for_manager(manager: PackageManager) -> Self {
        Self::new(manager.default_prefix())
    }

    /// Resolve the system package for a gem.
    pub fn system_package(&self, gem: &PackageName) -> SystemPackage {
        SystemPackage {
            name: format!("{}{}", self.prefix, gem.as_str()),
            gem: gem.clone(),
        }
    }
}

impl Default for NamingConvention {
    fn default() -> Self {
        Self::for_manager(PackageManager::Apt)
    }
}

/// A distribution package providing a gem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SystemPackage {
    /// Full package name as known to the package manager (e.g. `ruby-rake`)
    pub name: String,
    /// Gem the package was derived from
    pub gem: PackageName,
}

impl std::fmt::Display for SystemPackage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Configuration for retrying failed installs.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first
    pub max_attempts: u32,
    /// Base delay between retries
    pub base_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_factor: f64,
    /// Maximum delay between retries
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::no_retry()
    }
}

impl RetryConfig {
    /// Create a new retry config with custom settings.
    pub fn new(max_attempts: u32, base_delay: Duration, backoff_factor: f64) -> Self {
        Self {
            max_attempts,
            base_delay,
            backoff_factor,
            max_delay: Duration::from_secs(120),
        }
    }

    /// Retry `attempts` times in total with a 5s base delay, doubling each time.
    pub fn with_attempts(attempts: u32) -> Self {
        Self::new(attempts.max(1), Duration::from_secs(5), 2.0)
    }

    /// Calculate the delay for a given attempt number (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.base_delay.as_secs_f64() * self.backoff_factor.powi(attempt as i32);
        let capped = delay.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped)
    }

    /// A config that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::from_secs(5),
            backoff_factor: 2.0,
            max_delay: Duration::from_secs(120),
        }
    }
}
