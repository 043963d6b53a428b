//! Privilege checks for install commands.
//!
//! Package managers refuse to install as an unprivileged user. gemsync
//! never escalates on its own: either it runs as root, or `--sudo` prefixes
//! each install command with `sudo`.

/// Whether the process runs with an effective uid of 0.
pub fn is_root() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() == 0 }
}

/// Whether installs are expected to be refused for lack of privileges.
pub fn needs_privileges(use_sudo: bool, dry_run: bool) -> bool {
    !use_sudo && !dry_run && !is_root()
}
