//! Installation run state.

use std::{
  fmt,
  sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
  },
};

/// The phases of one installation run, in order. `Installed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallPhase {
  NotInstalled,
  SchemaCommitted,
  LocaleSet,
  AdminCreated,
  SessionEstablished,
  SessionSkipped,
  MailSeeded,
  ContentSeeded,
  Installed,
}

impl fmt::Display for InstallPhase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Self::NotInstalled => "not installed",
      Self::SchemaCommitted => "schema committed",
      Self::LocaleSet => "locale set",
      Self::AdminCreated => "admin created",
      Self::SessionEstablished => "session established",
      Self::SessionSkipped => "session skipped",
      Self::MailSeeded => "mail seeded",
      Self::ContentSeeded => "content seeded",
      Self::Installed => "installed",
    };
    f.write_str(name)
  }
}

/// Process-wide "installed" marker, flipped once when a run reaches
/// `Installed`.
///
/// This is a guard, not a mutual-exclusion primitive: two concurrent runs
/// against an uninitialized store must be prevented by the caller.
#[derive(Debug, Clone, Default)]
pub struct InstalledFlag(Arc<AtomicBool>);

impl InstalledFlag {
  pub fn new() -> Self { Self::default() }

  pub fn is_set(&self) -> bool { self.0.load(Ordering::SeqCst) }

  pub fn set(&self) { self.0.store(true, Ordering::SeqCst); }
}
