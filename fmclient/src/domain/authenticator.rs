//! Credential verification through an impersonated search.
//!
//! The authenticator searches an identity layout for the given username while
//! acting as that very user. The server only answers when the credentials are
//! valid, so a transport-level 401 means "invalid credentials" rather than a
//! failure.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use super::command::{Action, Command, CommandError, Parameters, quote_string};
use super::error::ErrorKind;
use super::identity::Identity;
use super::ports::{IdentityError, IdentityHandler, ResultSetClient, ResultSetError};

const UNAUTHORIZED: u16 = 401;

/// Outcome of an authentication attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationResult {
    /// The server accepted the credentials.
    Authenticated(Identity),
    /// The server rejected the credentials.
    InvalidCredentials,
}

impl AuthenticationResult {
    /// Whether the credentials were accepted.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    /// Identity to use for subsequent requests.
    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Authenticated(identity) => Some(identity),
            Self::InvalidCredentials => None,
        }
    }
}

/// Errors raised while authenticating.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthenticationError {
    /// The search command could not be built.
    #[error(transparent)]
    Command(#[from] CommandError),
    /// The search failed for a reason other than rejected credentials.
    #[error(transparent)]
    ResultSet(#[from] ResultSetError),
    /// The identity could not be created.
    #[error(transparent)]
    Identity(#[from] IdentityError),
    /// The credentials were accepted but the user record was not found.
    #[error("result set is empty")]
    EmptyResultSet,
}

impl AuthenticationError {
    /// Classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Command(error) => error.kind(),
            Self::ResultSet(error) => error.kind(),
            Self::Identity(error) => error.kind(),
            Self::EmptyResultSet => ErrorKind::InvalidResult,
        }
    }
}

/// Verifies username/password pairs against an identity layout.
pub struct Authenticator<C: ?Sized> {
    client: Arc<C>,
    identity_handler: Arc<dyn IdentityHandler>,
    identity_layout: String,
    username_field: String,
}

impl<C> Authenticator<C>
where
    C: ResultSetClient + ?Sized,
{
    /// Create an authenticator searching `username_field` on `identity_layout`.
    #[must_use]
    pub fn new(
        client: Arc<C>,
        identity_handler: Arc<dyn IdentityHandler>,
        identity_layout: impl Into<String>,
        username_field: impl Into<String>,
    ) -> Self {
        Self {
            client,
            identity_handler,
            identity_layout: identity_layout.into(),
            username_field: username_field.into(),
        }
    }

    /// Check `username` and `password` against the server.
    ///
    /// # Errors
    ///
    /// Returns [`AuthenticationError::EmptyResultSet`] when the server accepts
    /// the credentials but finds no matching user record. Any failure other
    /// than an HTTP 401 propagates unchanged.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthenticationResult, AuthenticationError> {
        let identity = self.identity_handler.create_identity(username, password)?;

        let mut parameters = Parameters::new();
        parameters.insert(
            self.username_field.as_str(),
            format!("=={}", quote_string(username)),
        );
        let command = Command::new(self.identity_layout.as_str(), parameters)?
            .with_action(Action::Find)
            .with_identity(identity.clone());

        let records = match self.client.execute(&command).await {
            Ok(records) => records,
            Err(ResultSetError::Connection { source }) if source.status() == Some(UNAUTHORIZED) => {
                debug!(username, "credentials rejected");
                return Ok(AuthenticationResult::InvalidCredentials);
            }
            Err(error) => return Err(error.into()),
        };

        if records.is_empty() {
            return Err(AuthenticationError::EmptyResultSet);
        }
        Ok(AuthenticationResult::Authenticated(identity))
    }
}
