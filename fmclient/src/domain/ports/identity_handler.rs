//! Driven port that turns plain credentials into an [`Identity`] and back.
//!
//! How passwords are protected at rest is an application concern; the
//! connection only needs the clear-text password while building one request.

use zeroize::Zeroizing;

use crate::domain::{ErrorKind, Identity};

use super::define_port_error;

define_port_error! {
    /// Errors raised by identity handlers.
    pub enum IdentityError {
        /// The password could not be encrypted.
        Encryption {
            /// Cipher diagnostics.
            message: String,
        } => "password encryption failed: {message}",
        /// The password could not be decrypted.
        Decryption {
            /// Cipher diagnostics.
            message: String,
        } => "password decryption failed: {message}",
    }
}

impl IdentityError {
    /// Identity handling failures are configuration problems.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        ErrorKind::Configuration
    }
}

/// Port for creating identities and recovering their passwords.
#[cfg_attr(test, mockall::automock)]
pub trait IdentityHandler: Send + Sync {
    /// Build an identity from clear-text credentials.
    fn create_identity(&self, username: &str, password: &str) -> Result<Identity, IdentityError>;

    /// Recover the clear-text password of an identity.
    fn decrypt_password(&self, identity: &Identity) -> Result<Zeroizing<String>, IdentityError>;
}

/// Handler that keeps the password as given.
///
/// Intended for tests and local tooling where no cipher is configured; the
/// password still lives in zeroized storage.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureIdentityHandler;

impl IdentityHandler for FixtureIdentityHandler {
    fn create_identity(&self, username: &str, password: &str) -> Result<Identity, IdentityError> {
        Ok(Identity::new(username, password))
    }

    fn decrypt_password(&self, identity: &Identity) -> Result<Zeroizing<String>, IdentityError> {
        Ok(Zeroizing::new(identity.encrypted_password().to_owned()))
    }
}
