//! Key material for signing the session cookie.

use std::fmt;

use ring::digest;
use secrecy::{ExposeSecret, SecretString};
use tower_sessions::cookie::Key;

/// The key the session cookie is signed with.
///
/// Cookie signing needs 64 bytes of key material, while a configured secret
/// can be any length. The key is the SHA-512 digest of the secret, so every
/// secret (including an empty one) maps to a full-length key.
#[derive(Clone)]
pub struct SessionKey {
    key: Key,
}

impl SessionKey {
    pub fn new(secret: &[u8]) -> Self {
        let digest = digest::digest(&digest::SHA512, secret);
        Self {
            key: Key::from(digest.as_ref()),
        }
    }

    /// Derives a key from a configured secret.
    ///
    /// An empty secret still yields a usable key. Such sessions can be forged
    /// by anyone who knows the secret is empty, which is why a missing
    /// `SESSION_SECRET` is reported at startup.
    pub fn from_secret(secret: &SecretString) -> Self {
        Self::new(secret.expose_secret().as_bytes())
    }

    pub(crate) fn cookie_key(&self) -> Key {
        self.key.clone()
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionKey").finish_non_exhaustive()
    }
}
