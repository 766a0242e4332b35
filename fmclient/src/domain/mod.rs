//! Domain model and services.
//!
//! Purpose: encode commands for the form-encoded request grammar, model the
//! typed records decoded from result sets, and map those records onto
//! application entities through an identity-mapped repository.
//!
//! Public surface:
//! - Command (alias to `command::Command`): validated request with layout,
//!   parameters, action, and optional identity.
//! - Record (alias to `record::Record`): one decoded row with related sets.
//! - Repository (alias to `repository::Repository`): find/insert/update/delete
//!   over one layout with optimistic concurrency.
//! - Authenticator (alias to `authenticator::Authenticator`): verifies
//!   credentials through an impersonated search.
//! - ErrorKind (alias to `error::ErrorKind`): classification shared by every
//!   error type.

pub mod authenticator;
pub mod command;
pub mod error;
pub mod field_type;
pub mod identity;
pub mod identity_map;
pub mod ports;
pub mod query;
pub mod record;
pub mod repository;
pub mod value;

pub use self::authenticator::{AuthenticationError, AuthenticationResult, Authenticator};
pub use self::command::{
    Action, Command, CommandError, ParameterValue, Parameters, encode, quote_string,
};
pub use self::error::ErrorKind;
pub use self::field_type::{
    BooleanType, DateTimeType, DecimalType, FieldType, NullableStringType, StringType,
};
pub use self::identity::Identity;
pub use self::identity_map::{EntityHandle, IdentityMap, ManagedEntry};
pub use self::query::{
    FindQuery, MAX_SORT_FIELDS, Query, Range, Search, Sort, SortOrder, TooManySortFields,
};
pub use self::record::{ModId, Record, RecordBuilder, RecordId};
pub use self::repository::{Repository, RepositoryError};
pub use self::value::{AssetReference, FieldValue, Value};
