//! Core shared types for keyword libraries.
//!
//! Everything that crosses the boundary between a keyword implementation and
//! the registry lives here: exposure metadata, argument specifications, the
//! dynamic calling convention, and the error taxonomy.

#![warn(missing_docs, clippy::pedantic)]

mod arguments;
mod doc;
mod error;
mod metadata;
mod signature;

/// Dynamic calling convention and the binder used by generated keyword code.
pub use arguments::{ArgumentBinder, Arguments, default_value, into_return};
/// Documentation normalisation applied to every registered keyword.
pub use doc::clean_doc;
/// Error types and result aliases shared across the workspace.
pub use error::{Error, KeywordError, KeywordResult, Result};
/// Exposure marking attached to callables at registration time.
pub use metadata::ExposureMetadata;
/// Argument specifications captured at registration time.
pub use signature::{ArgumentSpec, ArgumentSpecBuilder};
/// Value types used on the host boundary.
pub use serde_json::{Map, Value};
