//! Backend abstraction for the platform package manager.
//!
//! The [`Backend`] trait is the only thing the reconciler knows about the
//! host: whether a system package is installed, and how to install one.
//! Every call returns its result directly; nothing is read back from
//! process-global state after a command runs.

pub mod command;

use crate::error::Result;
use crate::platform;
use crate::types::{PackageManager, SystemPackage};

pub use command::CommandBackend;

/// Backend trait for package manager operations.
///
/// This trait abstracts the underlying package manager, enabling:
/// - Real CLI execution via `dpkg-query`/`apt-get`, `rpm`/`dnf`, ...
/// - Mock implementations for testing
/// - Decorators such as [`crate::retry::RetryingBackend`]
pub trait Backend: Send + Sync {
    /// Package manager this backend drives.
    fn manager(&self) -> PackageManager;

    /// Check whether the package manager's tools are present.
    fn is_available(&self) -> bool;

    /// Check if a system package is installed.
    ///
    /// `Ok(false)` means the package database answered "not installed".
    /// An `Err` means the database could not be asked and says nothing
    /// about the package.
    fn is_installed(&self, package: &SystemPackage) -> Result<bool>;

    /// Install a system package.
    fn install(&self, package: &SystemPackage) -> Result<()>;
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn manager(&self) -> PackageManager {
        (**self).manager()
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }

    fn is_installed(&self, package: &SystemPackage) -> Result<bool> {
        (**self).is_installed(package)
    }

    fn install(&self, package: &SystemPackage) -> Result<()> {
        (**self).install(package)
    }
}

/// Get a command backend for the detected package manager.
pub fn default_backend() -> Result<CommandBackend> {
    let manager = platform::detect()?;
    Ok(CommandBackend::new(manager))
}
