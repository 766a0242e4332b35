//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod connection;
mod identity_handler;
mod mapping;
mod result_set_client;

#[cfg(test)]
pub use connection::MockConnection;
pub use connection::{AssetStream, Connection, ConnectionError};
#[cfg(test)]
pub use identity_handler::MockIdentityHandler;
pub use identity_handler::{FixtureIdentityHandler, IdentityError, IdentityHandler};
pub use mapping::{Extraction, Hydration, MappingError};
#[cfg(test)]
pub use result_set_client::MockResultSetClient;
pub use result_set_client::{ResultSetClient, ResultSetError};
