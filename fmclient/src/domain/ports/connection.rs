//! Driven port for the HTTP exchange with the database server.
//!
//! The domain owns the request shape ([`Command`]) and expects the raw
//! response body back; decoding happens behind the
//! [`ResultSetClient`](super::ResultSetClient) port.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;

use crate::domain::{AssetReference, Command, ErrorKind};

use super::define_port_error;

/// Streamed body of a container asset.
pub type AssetStream = BoxStream<'static, Result<Bytes, ConnectionError>>;

define_port_error! {
    /// Errors surfaced while talking to the server.
    pub enum ConnectionError {
        /// Network transport failed before a response was received.
        Transport {
            /// Transport diagnostics.
            message: String,
        } =>
            "connection transport failed: {message}",
        /// The server answered with a status other than 200.
        UnsuccessfulResponse {
            /// HTTP status code.
            status: u16,
        } =>
            "server responded with HTTP status {status}",
        /// A request URI could not be built.
        InvalidUri {
            /// Why the URI was rejected.
            message: String,
        } =>
            "invalid server uri: {message}",
        /// The acting identity could not be turned into credentials.
        Identity {
            /// Why the identity could not be used.
            message: String,
        } =>
            "identity could not be applied: {message}",
    }
}

impl ConnectionError {
    /// Classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport { .. } | Self::UnsuccessfulResponse { .. } => ErrorKind::Protocol,
            Self::InvalidUri { .. } | Self::Identity { .. } => ErrorKind::Configuration,
        }
    }

    /// HTTP status of an unsuccessful response.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::UnsuccessfulResponse { status } => Some(*status),
            _ => None,
        }
    }
}

/// Port for sending commands and fetching assets.
///
/// Each call performs exactly one round trip; implementations must not retry.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Connection: Send + Sync {
    /// Send `command` to the given grammar endpoint and return the raw body.
    async fn execute(&self, command: &Command, grammar_path: &str)
    -> Result<String, ConnectionError>;

    /// Stream the bytes of a container asset.
    async fn get_asset(&self, asset: &AssetReference) -> Result<AssetStream, ConnectionError>;
}
