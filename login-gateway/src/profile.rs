use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::provider::AuthError;

/// The claims object returned by a provider's userinfo endpoint.
pub type Claims = Map<String, Value>;

/// A user as described by the identity provider.
///
/// Profiles are immutable once obtained: a fresh profile is fetched on every
/// successful callback and stored by value in the session.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// A human readable name, suitable for greeting the user.
    pub display_name: String,

    /// The provider's stable identifier for the user.
    pub provider_id: String,

    /// Every claim the provider returned, untouched.
    pub raw_claims: Claims,
}

impl UserProfile {
    /// Builds a profile from OpenID Connect style userinfo claims.
    ///
    /// The `sub` claim is required. The display name is taken from `name`,
    /// falling back to `email` and finally to the subject itself.
    ///
    /// ```rust
    /// use login_gateway::UserProfile;
    /// use serde_json::json;
    ///
    /// let claims = json!({ "sub": "42", "email": "ferris@example.com" });
    /// let profile = UserProfile::from_claims(claims.as_object().unwrap().clone()).unwrap();
    ///
    /// assert_eq!(profile.provider_id, "42");
    /// assert_eq!(profile.display_name, "ferris@example.com");
    /// ```
    pub fn from_claims(raw_claims: Claims) -> Result<Self, AuthError> {
        let provider_id = claim_str(&raw_claims, "sub")
            .ok_or(AuthError::MissingSubject)?
            .to_owned();

        let display_name = claim_str(&raw_claims, "name")
            .or_else(|| claim_str(&raw_claims, "email"))
            .unwrap_or(&provider_id)
            .to_owned();

        Ok(Self {
            display_name,
            provider_id,
            raw_claims,
        })
    }
}

// Here we've implemented `Debug` manually to avoid accidentally logging the
// provider's claims, which carry e.g. the user's email address.
impl fmt::Debug for UserProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserProfile")
            .field("display_name", &self.display_name)
            .field("provider_id", &self.provider_id)
            .field("raw_claims", &"[redacted]")
            .finish()
    }
}

fn claim_str<'a>(claims: &'a Claims, key: &str) -> Option<&'a str> {
    claims
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn claims(value: Value) -> Claims {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_from_claims_prefers_name() {
        let profile = UserProfile::from_claims(claims(json!({
            "sub": "1234",
            "name": "Ferris the Crab",
            "email": "ferris@example.com",
        })))
        .unwrap();

        assert_eq!(profile.display_name, "Ferris the Crab");
        assert_eq!(profile.provider_id, "1234");
        assert_eq!(profile.raw_claims["email"], "ferris@example.com");
    }

    #[test]
    fn test_from_claims_falls_back_to_subject() {
        let profile = UserProfile::from_claims(claims(json!({ "sub": "1234", "name": "" }))).unwrap();
        assert_eq!(profile.display_name, "1234");
    }

    #[test]
    fn test_debug_redacts_claims() {
        let profile = UserProfile::from_claims(claims(json!({
            "sub": "1234",
            "name": "Ferris",
            "email": "ferris@example.com",
        })))
        .unwrap();

        let debug = format!("{profile:?}");
        assert!(debug.contains("Ferris"));
        assert!(!debug.contains("ferris@example.com"));
    }

    #[test]
    fn test_from_claims_requires_subject() {
        let err = UserProfile::from_claims(claims(json!({ "name": "Ferris" }))).unwrap_err();
        assert!(matches!(err, AuthError::MissingSubject));
    }
}
