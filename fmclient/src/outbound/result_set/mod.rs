//! Result-set outbound adapter.
//!
//! This module decodes `fmresultset.xml` documents into domain records and
//! implements the `ResultSetClient` port on top of any `Connection`.

mod client;
mod decoder;
mod dto;
mod metadata;
mod reader;
mod transformer;

pub use client::{GRAMMAR_PATH, XmlResultSetClient};
pub use decoder::ResultSetDecoder;
pub use transformer::{TransformError, Transformer};
