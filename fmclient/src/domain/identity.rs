//! Credential bundle used to act as a specific database user.

use std::fmt;

use zeroize::Zeroizing;

/// Username plus an opaque, handler-encrypted password.
///
/// The password is only ever decrypted by an
/// [`IdentityHandler`](crate::domain::ports::IdentityHandler) while a request
/// is being built, and the stored form is wiped on drop.
///
/// # Examples
/// ```
/// use fmclient::domain::Identity;
///
/// let identity = Identity::new("ada", "ciphertext");
/// assert_eq!(identity.username(), "ada");
/// assert!(!format!("{identity:?}").contains("ciphertext"));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    username: String,
    encrypted_password: Zeroizing<String>,
}

impl Identity {
    /// Bundle a username with an already-encrypted password.
    #[must_use]
    pub fn new(username: impl Into<String>, encrypted_password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            encrypted_password: Zeroizing::new(encrypted_password.into()),
        }
    }

    /// Username sent as the Basic-Auth user.
    #[must_use]
    pub const fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Encrypted password, opaque outside the identity handler.
    #[must_use]
    pub fn encrypted_password(&self) -> &str {
        self.encrypted_password.as_str()
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("username", &self.username)
            .field("encrypted_password", &"<redacted>")
            .finish()
    }
}
