//! The schema definition catalog.
//!
//! Entity records register themselves here as descriptors; discovery filters
//! the registry down to the concrete descriptors that can build their own
//! table. The registry is populated statically at construction time, so
//! discovery order is declaration order — deterministic and reviewable.

use atrium_core::schema::SchemaDefinition;

use crate::records;

/// One registered entity record.
///
/// `schema` is the "can create its own table" capability; descriptors
/// without it are skipped. Non-concrete descriptors (abstract bases and
/// interface markers mirrored from the record catalog) are skipped too.
#[derive(Debug, Clone, Copy)]
pub struct RecordDescriptor {
  pub name:     &'static str,
  pub concrete: bool,
  pub schema:   Option<fn() -> SchemaDefinition>,
}

impl RecordDescriptor {
  /// A concrete record that owns a table.
  pub const fn table(
    name: &'static str,
    schema: fn() -> SchemaDefinition,
  ) -> Self {
    Self { name, concrete: true, schema: Some(schema) }
  }
}

/// The registry of entity records known to this build.
#[derive(Debug, Clone)]
pub struct Registry {
  descriptors: Vec<RecordDescriptor>,
}

impl Registry {
  pub fn new() -> Self { Self { descriptors: Vec::new() } }

  /// Every entity record shipped with the platform.
  pub fn platform() -> Self {
    let mut registry = Self::new();
    for descriptor in [
      RecordDescriptor::table("element", records::elements),
      RecordDescriptor::table("locale", records::locales),
      RecordDescriptor::table("user", records::users),
      RecordDescriptor::table("session", records::sessions),
      RecordDescriptor::table("field_group", records::field_groups),
      RecordDescriptor::table("field", records::fields),
      RecordDescriptor::table("section", records::sections),
      RecordDescriptor::table("section_locale", records::section_locales),
      RecordDescriptor::table("entry_type", records::entry_types),
      RecordDescriptor::table("entry", records::entries),
      RecordDescriptor::table("tag_group", records::tag_groups),
      RecordDescriptor::table("tag", records::tags),
      RecordDescriptor::table("system_settings", records::system_settings),
      RecordDescriptor::table("migration", records::migrations),
    ] {
      registry.register(descriptor);
    }
    registry
  }

  pub fn register(&mut self, descriptor: RecordDescriptor) {
    self.descriptors.push(descriptor);
  }

  /// The schema definitions of every installable record, in registration
  /// order. Non-conforming descriptors are skipped with a warning, never
  /// fatally.
  pub fn discover(&self) -> Vec<SchemaDefinition> {
    let mut definitions = Vec::with_capacity(self.descriptors.len());

    for descriptor in &self.descriptors {
      if !descriptor.concrete {
        tracing::warn!(
          record = descriptor.name,
          "skipping record: abstract or interface-only"
        );
        continue;
      }
      match descriptor.schema {
        Some(schema) => definitions.push(schema()),
        None => tracing::warn!(
          record = descriptor.name,
          "skipping record: no create-table capability"
        ),
      }
    }

    definitions
  }
}

impl Default for Registry {
  fn default() -> Self { Self::platform() }
}
