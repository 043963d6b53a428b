pub mod lines;
pub mod status;
pub mod sync;

use crate::Context;
use crate::cli::BackendArgs;
use crate::{progress, ui};
use anyhow::{Context as _, Result};
use gemkit::backend::{Backend, CommandBackend};
use gemkit::retry::RetryingBackend;
use gemkit::{Client, Manifest, NamingConvention, PackageManager, RetryConfig};
use std::path::Path;

/// Resolve the package manager: explicit choice first, detection otherwise.
fn resolve_manager(ctx: &Context, args: &BackendArgs) -> Result<PackageManager> {
    if let Some(manager) = args.manager {
        return Ok(manager.into());
    }

    let pb = (!ctx.quiet).then(|| progress::spinner("Detecting package manager..."));
    match gemkit::platform::detect() {
        Ok(manager) => {
            if let Some(pb) = &pb {
                progress::finish_success(pb, &format!("Using {manager}"));
            }
            Ok(manager)
        }
        Err(e) => {
            if let Some(pb) = &pb {
                progress::finish_error(pb, "No supported package manager found");
            }
            ui::dim(e.category().advice());
            Err(e).context("Failed to detect package manager")
        }
    }
}

/// Build the client every command talks to.
///
/// Installs are retried `retries` times in total; queries never are.
pub fn build_client(ctx: &Context, args: &BackendArgs, sudo: bool, retries: u32) -> Result<Client> {
    let manager = resolve_manager(ctx, args)?;
    let backend = RetryingBackend::new(
        CommandBackend::new(manager).with_sudo(sudo),
        RetryConfig::with_attempts(retries),
    );

    if !backend.is_available() {
        ui::warn(&format!(
            "{manager} tools were not found on PATH; queries will fail"
        ));
    }

    let client = Client::with_backend(Box::new(backend));
    Ok(match &args.prefix {
        Some(prefix) => client.with_naming(NamingConvention::new(prefix.as_str())),
        None => client,
    })
}

/// Read the manifest, explaining what to do when it is missing.
pub fn load_manifest(path: &Path) -> Result<Manifest> {
    match gemkit::manifest::read_manifest(path) {
        Ok(manifest) => Ok(manifest),
        Err(e) => {
            if matches!(e, gemkit::Error::ManifestNotFound(_)) {
                ui::info(e.category().advice());
            }
            Err(e.into())
        }
    }
}

/// Display label for the manifest source.
fn manifest_label(manifest: &Manifest) -> String {
    manifest
        .path
        .as_ref()
        .map_or_else(|| "<memory>".to_string(), |p| p.display().to_string())
}
