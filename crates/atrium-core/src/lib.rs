//! Core types and trait definitions for the atrium installation subsystem.
//!
//! This crate is deliberately free of database dependencies. All other
//! crates depend on it; it depends on nothing proprietary.

pub mod content;
pub mod error;
pub mod gateway;
pub mod info;
pub mod migration;
pub mod request;
pub mod schema;
pub mod state;

pub use error::{
  FieldError, InstallError, Result, SaveError, SchemaError, ValidationError,
};
