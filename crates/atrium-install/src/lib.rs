//! Installation orchestration for the atrium platform.
//!
//! Discovers the schema-defining records, applies the full table set and the
//! migration ledger atomically through a storage gateway, then seeds the
//! initial content (administrator, locale, default groups and sections).

pub mod catalog;
pub mod installer;
pub mod manifest;
pub mod records;
pub mod tables;

pub use catalog::{RecordDescriptor, Registry};
pub use installer::{InstallReport, InstallWarning, Installer};
pub use manifest::{BASELINE_VERSION, MigrationManifest};
