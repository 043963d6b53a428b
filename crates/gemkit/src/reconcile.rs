//! Reconciliation of a Gemfile against the installed system packages.
//!
//! Lines are processed strictly in file order, one at a time. For every
//! `gem <name>` declaration the backend is asked, fresh, whether the mapped
//! system package is installed, and the install action runs only when the
//! answer is a definite "no". A failed query never leads to an install.
//!
//! Per-line problems (malformed lines, query failures, failed installs) are
//! reported through [`ReconcileObserver`] and collected in the
//! [`ReconcileReport`]; they never stop the pass.

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::manifest::{self, DeclarationLine, Manifest};
use crate::types::{NamingConvention, PackageName, SystemPackage};
use log::{debug, info};
use std::path::Path;

/// What happened to one manifest line.
#[derive(Debug)]
pub enum Outcome {
    /// Blank line, comment or source directive
    Ignored,
    /// The package was already installed; nothing was done
    AlreadyInstalled(SystemPackage),
    /// The package was missing and has been installed
    Installed(SystemPackage),
    /// The package is missing; not installed because of a dry run
    WouldInstall(SystemPackage),
    /// The package is missing; the install was declined at the prompt
    Declined(SystemPackage),
    /// The install action reported a failure
    InstallFailed(SystemPackage, Error),
    /// The installed state could not be determined; no install attempted
    QueryFailed(SystemPackage, Error),
    /// The line could not be parsed
    Malformed(String),
}

impl Outcome {
    /// The system package this outcome concerns, if any.
    pub fn package(&self) -> Option<&SystemPackage> {
        match self {
            Outcome::AlreadyInstalled(p)
            | Outcome::Installed(p)
            | Outcome::WouldInstall(p)
            | Outcome::Declined(p)
            | Outcome::InstallFailed(p, _)
            | Outcome::QueryFailed(p, _) => Some(p),
            Outcome::Ignored | Outcome::Malformed(_) => None,
        }
    }

    /// Whether this outcome represents a problem worth reporting.
    pub fn is_problem(&self) -> bool {
        matches!(
            self,
            Outcome::InstallFailed(..) | Outcome::QueryFailed(..) | Outcome::Malformed(_)
        )
    }
}

/// Outcome of one line together with where it came from.
#[derive(Debug)]
pub struct LineReport {
    /// 1-based line number
    pub line: usize,
    /// How the line was classified
    pub declaration: DeclarationLine,
    /// What the reconciler did about it
    pub outcome: Outcome,
}

/// Collected outcomes of a full pass, in file order.
///
/// The report is informational: a run that hit malformed lines or failed
/// installs is still a completed run.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    /// One entry per manifest line
    pub lines: Vec<LineReport>,
}

impl ReconcileReport {
    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.lines.iter().filter(|l| pred(&l.outcome)).count()
    }

    /// Number of gem declarations seen.
    pub fn declarations(&self) -> usize {
        self.count(|o| o.package().is_some())
    }

    /// Packages installed during this run.
    pub fn installed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Installed(_)))
    }

    /// Packages that were already present.
    pub fn already_installed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::AlreadyInstalled(_)))
    }

    /// Packages a dry run would have installed.
    pub fn would_install(&self) -> usize {
        self.count(|o| matches!(o, Outcome::WouldInstall(_)))
    }

    /// Installs declined at the prompt.
    pub fn declined(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Declined(_)))
    }

    /// Installs that failed.
    pub fn install_failures(&self) -> usize {
        self.count(|o| matches!(o, Outcome::InstallFailed(..)))
    }

    /// Queries that could not be answered.
    pub fn query_failures(&self) -> usize {
        self.count(|o| matches!(o, Outcome::QueryFailed(..)))
    }

    /// Lines that could not be parsed.
    pub fn malformed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Malformed(_)))
    }

    /// Whether any line produced a problem.
    pub fn has_problems(&self) -> bool {
        self.lines.iter().any(|l| l.outcome.is_problem())
    }

    /// Problem lines only.
    pub fn problems(&self) -> impl Iterator<Item = &LineReport> {
        self.lines.iter().filter(|l| l.outcome.is_problem())
    }
}

/// Receives reconciliation events as they happen.
pub trait ReconcileObserver {
    /// Called right before the install action runs for a package.
    fn on_install_start(&mut self, _package: &SystemPackage) {}

    /// Called once a line has been fully processed.
    fn on_line_complete(&mut self, report: &LineReport);
}

/// Observer that ignores every event.
pub struct NoObserver;

impl ReconcileObserver for NoObserver {
    fn on_line_complete(&mut self, _report: &LineReport) {}
}

/// Asked before each install action.
pub trait ConfirmCallback {
    /// Return `true` to install `package`.
    fn confirm(&mut self, package: &SystemPackage) -> bool;
}

/// Confirms every install.
pub struct AutoConfirm;

impl ConfirmCallback for AutoConfirm {
    fn confirm(&mut self, _package: &SystemPackage) -> bool {
        true
    }
}

/// Options for a reconciliation pass.
#[derive(Debug, Clone, Default)]
pub struct ReconcileOptions {
    /// Query installed state but never run the install action
    pub dry_run: bool,
}

/// Drives a manifest through classification, query and install.
pub struct Reconciler<'a> {
    backend: &'a dyn Backend,
    naming: NamingConvention,
    options: ReconcileOptions,
}

impl<'a> Reconciler<'a> {
    /// Create a reconciler over a backend and naming convention.
    pub fn new(backend: &'a dyn Backend, naming: NamingConvention) -> Self {
        Self {
            backend,
            naming,
            options: ReconcileOptions::default(),
        }
    }

    /// Set the pass options.
    pub fn with_options(mut self, options: ReconcileOptions) -> Self {
        self.options = options;
        self
    }

    /// Naming convention in use.
    pub fn naming(&self) -> &NamingConvention {
        &self.naming
    }

    /// Reconcile every line of `manifest`, in order.
    pub fn run(
        &self,
        manifest: &Manifest,
        observer: &mut dyn ReconcileObserver,
        confirm: &mut dyn ConfirmCallback,
    ) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        for classified in manifest.classify() {
            let outcome = self.reconcile_declaration(&classified.declaration, observer, confirm);
            let line = LineReport {
                line: classified.line,
                declaration: classified.declaration,
                outcome,
            };
            observer.on_line_complete(&line);
            report.lines.push(line);
        }

        report
    }

    /// Read the manifest at `path` and reconcile it.
    ///
    /// A missing manifest aborts before any query or install.
    pub fn run_file(
        &self,
        path: &Path,
        observer: &mut dyn ReconcileObserver,
        confirm: &mut dyn ConfirmCallback,
    ) -> Result<ReconcileReport> {
        let manifest = manifest::read_manifest(path)?;
        Ok(self.run(&manifest, observer, confirm))
    }

    /// Decide and act on a single classified line.
    pub fn reconcile_declaration(
        &self,
        declaration: &DeclarationLine,
        observer: &mut dyn ReconcileObserver,
        confirm: &mut dyn ConfirmCallback,
    ) -> Outcome {
        match declaration {
            DeclarationLine::Blank | DeclarationLine::Comment | DeclarationLine::SourceDirective => {
                Outcome::Ignored
            }
            DeclarationLine::Malformed { raw } => {
                debug!("Unable to determine gem name from line: {raw}");
                Outcome::Malformed(raw.clone())
            }
            DeclarationLine::PackageDeclaration { name } => {
                self.reconcile_package(name, observer, confirm)
            }
        }
    }

    fn reconcile_package(
        &self,
        name: &PackageName,
        observer: &mut dyn ReconcileObserver,
        confirm: &mut dyn ConfirmCallback,
    ) -> Outcome {
        let package = self.naming.system_package(name);

        match self.backend.is_installed(&package) {
            Ok(true) => {
                info!("Package {package} is already installed.");
                Outcome::AlreadyInstalled(package)
            }
            Ok(false) if self.options.dry_run => {
                info!("Package {package} would be installed");
                Outcome::WouldInstall(package)
            }
            Ok(false) => {
                if !confirm.confirm(&package) {
                    info!("Install of {package} declined");
                    return Outcome::Declined(package);
                }

                observer.on_install_start(&package);
                match self.backend.install(&package) {
                    Ok(()) => {
                        info!("Installed {package}");
                        Outcome::Installed(package)
                    }
                    Err(e) => {
                        info!("Install of {package} failed: {e}");
                        Outcome::InstallFailed(package, e)
                    }
                }
            }
            Err(e) => {
                info!("Could not determine whether {package} is installed: {e}");
                Outcome::QueryFailed(package, e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PackageManager;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// In-memory package database recording every call.
    #[derive(Default)]
    struct MockBackend {
        installed: Mutex<HashSet<String>>,
        failing_installs: HashSet<String>,
        failing_queries: HashSet<String>,
        queries: Mutex<Vec<String>>,
        installs: Mutex<Vec<String>>,
    }

    impl MockBackend {
        fn with_installed(names: &[&str]) -> Self {
            let backend = Self::default();
            backend
                .installed
                .lock()
                .unwrap()
                .extend(names.iter().map(|n| n.to_string()));
            backend
        }

        fn queries(&self) -> Vec<String> {
            self.queries.lock().unwrap().clone()
        }

        fn installs(&self) -> Vec<String> {
            self.installs.lock().unwrap().clone()
        }
    }

    impl Backend for MockBackend {
        fn manager(&self) -> PackageManager {
            PackageManager::Apt
        }

        fn is_available(&self) -> bool {
            true
        }

        fn is_installed(&self, package: &SystemPackage) -> Result<bool> {
            self.queries.lock().unwrap().push(package.name.clone());
            if self.failing_queries.contains(&package.name) {
                return Err(Error::QueryFailed {
                    package: package.name.clone(),
                    message: "status database unreadable".to_string(),
                });
            }
            Ok(self.installed.lock().unwrap().contains(&package.name))
        }

        fn install(&self, package: &SystemPackage) -> Result<()> {
            self.installs.lock().unwrap().push(package.name.clone());
            if self.failing_installs.contains(&package.name) {
                return Err(Error::NotFound {
                    name: package.name.clone(),
                });
            }
            self.installed.lock().unwrap().insert(package.name.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingObserver {
        completed: Vec<usize>,
        install_starts: Vec<String>,
    }

    impl ReconcileObserver for RecordingObserver {
        fn on_install_start(&mut self, package: &SystemPackage) {
            self.install_starts.push(package.name.clone());
        }

        fn on_line_complete(&mut self, report: &LineReport) {
            self.completed.push(report.line);
        }
    }

    struct DeclineAll;

    impl ConfirmCallback for DeclineAll {
        fn confirm(&mut self, _package: &SystemPackage) -> bool {
            false
        }
    }

    const SAMPLE: &str = "# header\n\nsource http://x\ngem nokogiri\ngem rails extra\n";

    fn run(backend: &MockBackend, content: &str) -> ReconcileReport {
        let reconciler = Reconciler::new(backend, NamingConvention::default());
        reconciler.run(&Manifest::from_string(content), &mut NoObserver, &mut AutoConfirm)
    }

    #[test]
    fn test_end_to_end_sample() {
        let backend = MockBackend::default();
        let report = run(&backend, SAMPLE);

        let kinds: Vec<&str> = report.lines.iter().map(|l| l.declaration.kind()).collect();
        assert_eq!(kinds, vec!["comment", "blank", "source", "gem", "malformed"]);

        assert_eq!(backend.queries(), vec!["ruby-nokogiri"]);
        assert_eq!(backend.installs(), vec!["ruby-nokogiri"]);

        assert!(matches!(report.lines[3].outcome, Outcome::Installed(ref p) if p.name == "ruby-nokogiri"));
        assert!(matches!(report.lines[4].outcome, Outcome::Malformed(ref raw) if raw == "gem rails extra"));
        assert_eq!(report.installed(), 1);
        assert_eq!(report.malformed(), 1);
        assert!(report.has_problems());
    }

    #[test]
    fn test_already_installed_is_not_reinstalled() {
        let backend = MockBackend::with_installed(&["ruby-rake"]);
        let report = run(&backend, "gem rake\ngem pg\n");

        assert_eq!(backend.installs(), vec!["ruby-pg"]);
        assert_eq!(report.already_installed(), 1);
        assert_eq!(report.installed(), 1);
        assert_eq!(report.declarations(), 2);
    }

    #[test]
    fn test_second_run_is_idempotent() {
        let backend = MockBackend::default();
        let content = "source https://rubygems.org\ngem rake\ngem pg\ngem bad line\n";

        let first = run(&backend, content);
        assert_eq!(first.installed(), 2);

        let second = run(&backend, content);
        assert_eq!(second.installed(), 0);
        assert_eq!(second.already_installed(), 2);
        assert_eq!(backend.installs().len(), 2);

        let first_kinds: Vec<_> = first.lines.iter().map(|l| l.declaration.clone()).collect();
        let second_kinds: Vec<_> = second.lines.iter().map(|l| l.declaration.clone()).collect();
        assert_eq!(first_kinds, second_kinds);
    }

    #[test]
    fn test_query_failure_never_installs() {
        let backend = MockBackend {
            failing_queries: HashSet::from(["ruby-rake".to_string()]),
            ..Default::default()
        };
        let report = run(&backend, "gem rake\ngem pg\n");

        assert_eq!(backend.installs(), vec!["ruby-pg"]);
        assert!(matches!(report.lines[0].outcome, Outcome::QueryFailed(..)));
        assert_eq!(report.query_failures(), 1);
    }

    #[test]
    fn test_install_failure_is_surfaced_and_processing_continues() {
        let backend = MockBackend {
            failing_installs: HashSet::from(["ruby-missing".to_string()]),
            ..Default::default()
        };
        let report = run(&backend, "gem missing\ngem rake\n");

        assert_eq!(backend.installs(), vec!["ruby-missing", "ruby-rake"]);
        match &report.lines[0].outcome {
            Outcome::InstallFailed(pkg, Error::NotFound { name }) => {
                assert_eq!(pkg.name, "ruby-missing");
                assert_eq!(name, "ruby-missing");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(matches!(report.lines[1].outcome, Outcome::Installed(_)));
        assert_eq!(report.install_failures(), 1);
    }

    #[test]
    fn test_dry_run_queries_without_installing() {
        let backend = MockBackend::with_installed(&["ruby-rake"]);
        let reconciler = Reconciler::new(&backend, NamingConvention::default())
            .with_options(ReconcileOptions { dry_run: true });
        let report = reconciler.run(
            &Manifest::from_string("gem rake\ngem pg\n"),
            &mut NoObserver,
            &mut AutoConfirm,
        );

        assert_eq!(backend.queries(), vec!["ruby-rake", "ruby-pg"]);
        assert!(backend.installs().is_empty());
        assert_eq!(report.would_install(), 1);
        assert_eq!(report.already_installed(), 1);
    }

    #[test]
    fn test_declined_install() {
        let backend = MockBackend::default();
        let reconciler = Reconciler::new(&backend, NamingConvention::default());
        let report = reconciler.run(
            &Manifest::from_string("gem rake\n"),
            &mut NoObserver,
            &mut DeclineAll,
        );

        assert!(backend.installs().is_empty());
        assert_eq!(report.declined(), 1);
        assert!(!report.has_problems());
    }

    #[test]
    fn test_observer_sees_every_line_in_order() {
        let backend = MockBackend::with_installed(&["ruby-rake"]);
        let reconciler = Reconciler::new(&backend, NamingConvention::default());
        let mut observer = RecordingObserver::default();
        reconciler.run(
            &Manifest::from_string("# deps\ngem rake\ngem pg\n"),
            &mut observer,
            &mut AutoConfirm,
        );

        assert_eq!(observer.completed, vec![1, 2, 3]);
        assert_eq!(observer.install_starts, vec!["ruby-pg"]);
    }

    #[test]
    fn test_naming_convention_is_applied_verbatim() {
        let backend = MockBackend::default();
        let reconciler = Reconciler::new(&backend, NamingConvention::new("rubygem-"));
        reconciler.run(
            &Manifest::from_string("gem RedCloth\n"),
            &mut NoObserver,
            &mut AutoConfirm,
        );

        assert_eq!(backend.queries(), vec!["rubygem-RedCloth"]);
    }

    #[test]
    fn test_missing_manifest_performs_no_queries() {
        let dir = tempfile::TempDir::new().unwrap();
        let backend = MockBackend::default();
        let reconciler = Reconciler::new(&backend, NamingConvention::default());

        let result = reconciler.run_file(
            &dir.path().join("Gemfile"),
            &mut NoObserver,
            &mut AutoConfirm,
        );

        assert!(matches!(result, Err(Error::ManifestNotFound(_))));
        assert!(backend.queries().is_empty());
        assert!(backend.installs().is_empty());
    }

    #[test]
    fn test_run_file_reads_from_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("Gemfile"), SAMPLE).unwrap();
        let backend = MockBackend::default();
        let reconciler = Reconciler::new(&backend, NamingConvention::default());

        let report = reconciler
            .run_file(dir.path(), &mut NoObserver, &mut AutoConfirm)
            .unwrap();

        assert_eq!(report.lines.len(), 5);
        assert_eq!(backend.installs(), vec!["ruby-nokogiri"]);
    }

    #[test]
    fn test_duplicate_declarations_query_each_time() {
        let backend = MockBackend::default();
        let report = run(&backend, "gem rake\ngem rake\n");

        assert_eq!(backend.queries(), vec!["ruby-rake", "ruby-rake"]);
        assert_eq!(backend.installs(), vec!["ruby-rake"]);
        assert_eq!(report.already_installed(), 1);
    }
}
