//! Error types for Gemfile reconciliation.
//!
//! Install failures are categorized from the package manager's stderr so the
//! retry policy can tell transient conditions (network, a held package
//! database lock) from permanent ones (unknown package, missing privileges).

use std::path::PathBuf;
use thiserror::Error;

/// Categories of errors for retry logic and user feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Network-related errors (transient, retryable)
    Network,
    /// Another process holds the package database lock (transient, retryable)
    Locked,
    /// Package not available from any configured repository
    NotFound,
    /// Permission denied (needs root)
    Permission,
    /// The installed-state query could not be answered
    Query,
    /// The manifest file does not exist
    ManifestNotFound,
    /// No supported package manager on this host
    PackageManagerNotFound,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    /// Whether this error category is typically transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network | Self::Locked)
    }

    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "Network connectivity issue",
            Self::Locked => "Package database locked",
            Self::NotFound => "Package not found",
            Self::Permission => "Permission denied",
            Self::Query => "Installed-state query failed",
            Self::ManifestNotFound => "Gemfile not found",
            Self::PackageManagerNotFound => "No supported package manager",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Network => "Check your network connection and mirror configuration",
            Self::Locked => "Wait for the other package manager process to finish",
            Self::NotFound => "The gem may not be packaged by your distribution; install it with `gem install`",
            Self::Permission => "Run as root or pass --sudo",
            Self::Query => "Check that the package database is readable",
            Self::ManifestNotFound => "Run from the directory containing the Gemfile or pass --file",
            Self::PackageManagerNotFound => "Select one explicitly with --manager",
            Self::Other => "Check the error details for more information",
        }
    }
}

/// Errors that can occur while reading a manifest or talking to the package
/// manager.
#[derive(Debug, Error)]
pub enum Error {
    /// Manifest file not found at the specified path
    #[error("Gemfile not found: {}", .0.display())]
    ManifestNotFound(PathBuf),

    /// A gem name that is not a bare identifier
    #[error("invalid gem name: {0:?}")]
    InvalidPackageName(String),

    /// No supported package manager could be detected
    #[error("no supported package manager found (looked for apt, dnf, yum, pacman, zypper, apk)")]
    PackageManagerNotFound,

    /// The installed-state query itself failed
    #[error("could not query install state of {package}: {message}")]
    QueryFailed {
        /// System package being queried
        package: String,
        /// What went wrong
        message: String,
    },

    /// Network-related error while downloading a package
    #[error("network error: {message}")]
    Network {
        /// Detailed error message from the package manager
        message: String,
    },

    /// Package database is locked by another process
    #[error("package database locked: {message}")]
    Locked {
        /// Detailed error message from the package manager
        message: String,
    },

    /// Package not found in any repository
    #[error("package not found: {name}")]
    NotFound {
        /// Name of the package that could not be found
        name: String,
    },

    /// Permission denied
    #[error("permission denied: {message}")]
    Permission {
        /// Details about what permission was denied
        message: String,
    },

    /// Command execution failed
    #[error("command failed: {message}")]
    CommandFailed {
        /// Description of what command failed
        message: String,
        /// Standard error output from the failed command
        stderr: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Get the error category for retry logic.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::ManifestNotFound(_) => ErrorCategory::ManifestNotFound,
            Error::PackageManagerNotFound => ErrorCategory::PackageManagerNotFound,
            Error::QueryFailed { .. } => ErrorCategory::Query,
            Error::Network { .. } => ErrorCategory::Network,
            Error::Locked { .. } => ErrorCategory::Locked,
            Error::NotFound { .. } => ErrorCategory::NotFound,
            Error::Permission { .. } => ErrorCategory::Permission,
            _ => ErrorCategory::Other,
        }
    }

    /// Whether this error is typically transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    /// Create an error from a failed install command.
    ///
    /// Analyzes stderr to categorize the error. The patterns cover the
    /// messages emitted by apt-get, dnf/yum, pacman, zypper and apk.
    pub fn from_command_output(program: &str, stderr: &str, package_name: Option<&str>) -> Self {
        let stderr_lower = stderr.to_lowercase();

        // apt reports a missing-root lock failure with both wordings
        if stderr_lower.contains("are you root")
            || stderr_lower.contains("you need to be root")
            || stderr_lower.contains("must be run as root")
            || stderr_lower.contains("permission denied")
            || stderr_lower.contains("operation not permitted")
        {
            return Error::Permission {
                message: stderr.trim().to_string(),
            };
        }

        if stderr_lower.contains("could not get lock")
            || stderr_lower.contains("unable to acquire the dpkg frontend lock")
            || stderr_lower.contains("unable to lock database")
            || stderr_lower.contains("waiting for cache lock")
            || stderr_lower.contains("system management is locked")
        {
            return Error::Locked {
                message: stderr.trim().to_string(),
            };
        }

        if stderr_lower.contains("temporary failure resolving")
            || stderr_lower.contains("could not resolve")
            || stderr_lower.contains("failed to fetch")
            || stderr_lower.contains("failed retrieving file")
            || stderr_lower.contains("cannot download")
            || stderr_lower.contains("curl error")
            || stderr_lower.contains("connection refused")
            || stderr_lower.contains("connection timed out")
            || stderr_lower.contains("network is unreachable")
        {
            return Error::Network {
                message: stderr.trim().to_string(),
            };
        }

        if stderr_lower.contains("unable to locate package")
            || stderr_lower.contains("has no installation candidate")
            || stderr_lower.contains("no match for argument")
            || stderr_lower.contains("target not found")
            || stderr_lower.contains("not found in package names")
            || stderr_lower.contains("no such package")
            || stderr_lower.contains("unable to select packages")
        {
            return Error::NotFound {
                name: package_name.unwrap_or("unknown").to_string(),
            };
        }

        Error::CommandFailed {
            message: format!(
                "{program} failed{}",
                package_name
                    .map(|n| format!(" for {n}"))
                    .unwrap_or_default()
            ),
            stderr: stderr.trim().to_string(),
        }
    }
}

/// Result type for gemkit operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_retryable() {
        assert!(ErrorCategory::Network.is_retryable());
        assert!(ErrorCategory::Locked.is_retryable());
        assert!(!ErrorCategory::NotFound.is_retryable());
        assert!(!ErrorCategory::Query.is_retryable());
    }

    #[test]
    fn test_from_output_apt_not_found() {
        let err = Error::from_command_output(
            "apt-get",
            "E: Unable to locate package ruby-doesnotexist",
            Some("ruby-doesnotexist"),
        );
        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_from_output_apt_lock() {
        let err = Error::from_command_output(
            "apt-get",
            "E: Could not get lock /var/lib/dpkg/lock-frontend. It is held by process 1234 (apt)",
            Some("ruby-rake"),
        );
        assert_eq!(err.category(), ErrorCategory::Locked);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_from_output_network() {
        let err = Error::from_command_output(
            "apt-get",
            "E: Failed to fetch http://deb.debian.org/pool/main/r/ruby-rake.deb  Temporary failure resolving 'deb.debian.org'",
            Some("ruby-rake"),
        );
        assert_eq!(err.category(), ErrorCategory::Network);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_from_output_permission() {
        let err = Error::from_command_output(
            "apt-get",
            "E: Could not open lock file /var/lib/dpkg/lock-frontend - open (13: Permission denied)\nE: Unable to acquire the dpkg frontend lock (/var/lib/dpkg/lock-frontend), are you root?",
            Some("ruby-rake"),
        );
        assert_eq!(err.category(), ErrorCategory::Permission);
        assert!(!err.is_retryable());

        let err = Error::from_command_output(
            "pacman",
            "error: you cannot perform this operation unless you are root.\nerror: you need to be root",
            Some("ruby-rake"),
        );
        assert_eq!(err.category(), ErrorCategory::Permission);
    }

    #[test]
    fn test_from_output_dnf_and_pacman_not_found() {
        let err = Error::from_command_output("dnf", "No match for argument: rubygem-foo", Some("rubygem-foo"));
        assert!(matches!(err, Error::NotFound { ref name } if name == "rubygem-foo"));

        let err = Error::from_command_output("pacman", "error: target not found: ruby-foo", Some("ruby-foo"));
        assert_eq!(err.category(), ErrorCategory::NotFound);
    }

    #[test]
    fn test_from_output_fallback() {
        let err = Error::from_command_output("apk", "something odd", Some("ruby-foo"));
        match err {
            Error::CommandFailed { message, stderr } => {
                assert_eq!(message, "apk failed for ruby-foo");
                assert_eq!(stderr, "something odd");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_manifest_not_found_message() {
        let err = Error::ManifestNotFound(PathBuf::from("./Gemfile"));
        assert_eq!(err.to_string(), "Gemfile not found: ./Gemfile");
        assert_eq!(err.category(), ErrorCategory::ManifestNotFound);
    }
}
