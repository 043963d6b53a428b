//! Package manager detection.
//!
//! The distribution is identified from `/etc/os-release` (`ID`, then each
//! entry of `ID_LIKE`). When that file is missing or names an unknown
//! distribution, the package tools on `PATH` are probed instead.
//!
//! ```no_run
//! let manager = gemkit::platform::detect().expect("no package manager");
//! println!("Using {manager}");
//! ```

use crate::error::{Error, Result};
use crate::types::PackageManager;
use log::debug;
use std::path::Path;

const OS_RELEASE: &str = "/etc/os-release";

/// Probe order when `/etc/os-release` does not settle the question.
const PROBE_ORDER: [(PackageManager, &str); 6] = [
    (PackageManager::Apt, "apt-get"),
    (PackageManager::Dnf, "dnf"),
    (PackageManager::Yum, "yum"),
    (PackageManager::Pacman, "pacman"),
    (PackageManager::Zypper, "zypper"),
    (PackageManager::Apk, "apk"),
];

/// Detect the package manager of the running system.
pub fn detect() -> Result<PackageManager> {
    detect_with(Path::new(OS_RELEASE), |program| which::which(program).is_ok())
}

/// Detection with an injectable os-release path and `PATH` probe.
pub fn detect_with(os_release: &Path, has_program: impl Fn(&str) -> bool) -> Result<PackageManager> {
    if let Ok(content) = std::fs::read_to_string(os_release)
        && let Some(manager) = from_os_release(&content, &has_program)
    {
        debug!("Detected {} from {}", manager, os_release.display());
        return Ok(manager);
    }

    for (manager, program) in PROBE_ORDER {
        if has_program(program) {
            debug!("Detected {} from {} on PATH", manager, program);
            return Ok(manager);
        }
    }

    Err(Error::PackageManagerNotFound)
}

/// Pick a package manager from the contents of an os-release file.
pub fn from_os_release(content: &str, has_program: impl Fn(&str) -> bool) -> Option<PackageManager> {
    let mut ids = Vec::new();
    if let Some(id) = os_release_value(content, "ID") {
        ids.push(id);
    }
    if let Some(like) = os_release_value(content, "ID_LIKE") {
        ids.extend(like.split_whitespace().map(str::to_string));
    }

    ids.iter()
        .find_map(|id| manager_for_distribution(&id.to_lowercase(), &has_program))
}

/// Map an os-release distribution id to its package manager.
fn manager_for_distribution(id: &str, has_program: impl Fn(&str) -> bool) -> Option<PackageManager> {
    match id {
        "debian" | "ubuntu" | "raspbian" | "linuxmint" | "pop" | "kali" => Some(PackageManager::Apt),
        "fedora" => Some(PackageManager::Dnf),
        "rhel" | "centos" | "rocky" | "almalinux" | "ol" => {
            if has_program("dnf") {
                Some(PackageManager::Dnf)
            } else {
                Some(PackageManager::Yum)
            }
        }
        "arch" | "manjaro" | "endeavouros" => Some(PackageManager::Pacman),
        "alpine" => Some(PackageManager::Apk),
        id if id == "suse" || id == "sles" || id.starts_with("opensuse") => {
            Some(PackageManager::Zypper)
        }
        _ => None,
    }
}

/// Read `KEY=value` from os-release text, stripping optional quotes.
fn os_release_value(content: &str, key: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let (k, v) = line.trim().split_once('=')?;
        (k == key).then(|| v.trim().trim_matches(|c| c == '"' || c == '\'').to_string())
    })
}
