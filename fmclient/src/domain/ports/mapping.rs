//! Driven ports mapping records to application entities and back.
//!
//! The application's mapping layer decides which record fields feed which
//! entity properties. The repository only calls these strategies and tracks
//! the resulting entities in its identity map.

use crate::domain::{ErrorKind, Parameters, Record};

use super::define_port_error;

define_port_error! {
    /// Errors raised by hydration, extraction, or field-type conversion.
    pub enum MappingError {
        /// A record could not be turned into an entity.
        Hydration {
            /// Strategy diagnostics.
            message: String,
        } => "hydration failed: {message}",
        /// An entity could not be turned into command parameters.
        Extraction {
            /// Strategy diagnostics.
            message: String,
        } => "extraction failed: {message}",
        /// A single value did not have the expected kind.
        Conversion {
            /// Kind the field type accepts.
            expected: String,
            /// Kind that was supplied.
            found: String,
        } =>
            "expected a {expected} value, found {found}",
    }
}

impl MappingError {
    /// Classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        ErrorKind::Mapping
    }
}

/// Strategy building entities from records.
pub trait Hydration<E>: Send + Sync {
    /// Build a fresh entity from a record.
    fn hydrate_new_entity(&self, record: &Record) -> Result<E, MappingError>;

    /// Refresh an existing entity in place, e.g. with server-computed fields.
    fn hydrate_existing_entity(&self, record: &Record, entity: &mut E) -> Result<(), MappingError>;
}

/// Strategy turning an entity into mutation parameters.
pub trait Extraction<E>: Send + Sync {
    /// Writable fields of `entity` as command parameters.
    fn extract(&self, entity: &E) -> Result<Parameters, MappingError>;
}
