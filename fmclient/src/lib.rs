//! Data access for FileMaker's XML result-set grammar.
//!
//! Commands are encoded in the domain, sent through an HTTP connection,
//! decoded against each response's metadata, and mapped onto entities by an
//! identity-mapped repository.

pub mod domain;
pub mod outbound;
