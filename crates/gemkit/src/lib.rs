//! # gemkit
//!
//! Install the gems a Gemfile declares as distribution packages.
//!
//! This crate provides functionality for:
//! - Reading a Gemfile and classifying each of its lines
//! - Mapping gem names to system package names (`ruby-rake`, `rubygem-rake`)
//! - Asking the platform package database whether a package is installed
//! - Installing missing packages, with optional retry on transient failures
//! - Reconciling the whole manifest line by line
//!
//! ## Example
//!
//! ```no_run
//! use gemkit::Client;
//! use gemkit::reconcile::{AutoConfirm, NoObserver, ReconcileOptions};
//! use std::path::Path;
//!
//! let client = Client::new().expect("no supported package manager");
//! let manifest = client.read_manifest(Path::new("Gemfile")).expect("no Gemfile");
//!
//! let report = client
//!     .reconciler(ReconcileOptions::default())
//!     .run(&manifest, &mut NoObserver, &mut AutoConfirm);
//! println!("{} installed, {} already present", report.installed(), report.already_installed());
//! ```
//!
//! ## Manifest format
//!
//! Only a flat subset of the Gemfile DSL is understood: comments, blank
//! lines, `source` directives and bare `gem <name>` declarations. Anything
//! else, including version pins, is reported as malformed.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod error;
pub mod manifest;
pub mod platform;
pub mod reconcile;
pub mod retry;
pub mod types;

pub use error::{Error, ErrorCategory, Result};
pub use manifest::{ClassifiedLine, DeclarationLine, Manifest};
pub use reconcile::{Outcome, ReconcileReport, Reconciler};
pub use types::{NamingConvention, PackageManager, PackageName, RetryConfig, SystemPackage};

use backend::{Backend, CommandBackend};
use reconcile::ReconcileOptions;
use std::path::Path;

/// High-level client for Gemfile reconciliation.
///
/// The client wraps a backend and the naming convention that maps gem
/// names onto that backend's package names.
pub struct Client {
    backend: Box<dyn Backend>,
    naming: NamingConvention,
}

impl Client {
    /// Create a client for the detected package manager.
    ///
    /// Returns an error if no supported package manager is found.
    pub fn new() -> Result<Self> {
        let backend = backend::default_backend()?;
        Ok(Self::with_backend(Box::new(backend)))
    }

    /// Create a client driving a specific package manager.
    pub fn for_manager(manager: PackageManager) -> Self {
        Self::with_backend(Box::new(CommandBackend::new(manager)))
    }

    /// Create a client with a custom backend (useful for testing).
    ///
    /// The naming convention defaults to the backend's package manager.
    pub fn with_backend(backend: Box<dyn Backend>) -> Self {
        let naming = NamingConvention::for_manager(backend.manager());
        Self { backend, naming }
    }

    /// Override the naming convention.
    pub fn with_naming(mut self, naming: NamingConvention) -> Self {
        self.naming = naming;
        self
    }

    /// Package manager in use.
    pub fn manager(&self) -> PackageManager {
        self.backend.manager()
    }

    /// Naming convention in use.
    pub fn naming(&self) -> &NamingConvention {
        &self.naming
    }

    /// Check if the package manager's tools are available.
    pub fn is_available(&self) -> bool {
        self.backend.is_available()
    }

    /// System package a gem maps to.
    pub fn system_package(&self, gem: &PackageName) -> SystemPackage {
        self.naming.system_package(gem)
    }

    /// Check whether the package for a gem is installed.
    pub fn is_installed(&self, gem: &PackageName) -> Result<bool> {
        self.backend.is_installed(&self.system_package(gem))
    }

    /// Install the package for a gem.
    pub fn install(&self, gem: &PackageName) -> Result<()> {
        self.backend.install(&self.system_package(gem))
    }

    /// Read a manifest from a path.
    pub fn read_manifest(&self, path: &Path) -> Result<Manifest> {
        manifest::read_manifest(path)
    }

    /// Reconciler bound to this client's backend and naming convention.
    pub fn reconciler(&self, options: ReconcileOptions) -> Reconciler<'_> {
        Reconciler::new(self.backend.as_ref(), self.naming.clone()).with_options(options)
    }
}
