//! Configuration loaded from the environment.

use std::net::SocketAddr;

use oauth2::url::{self, Url};
use secrecy::{ExposeSecret, SecretString};

pub const CALLBACK_PATH: &str = "/auth/google/callback";

const DEFAULT_CALLBACK_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://www.googleapis.com/oauth2/v3/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";

/// A configuration value that is present but unusable. These stop startup.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("{var} is not a valid URL: {source}")]
    Url {
        var: &'static str,
        source: url::ParseError,
    },

    #[error("{var} is not a valid socket address: {value}")]
    Addr { var: &'static str, value: String },

    #[error("{var} must be `true` or `false`, got {value}")]
    Bool { var: &'static str, value: String },

    #[error("could not build the provider HTTP client: {0}")]
    HttpClient(reqwest::Error),
}

/// A configuration value that is missing. These are reported but do not stop
/// startup.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    #[error("{0} is not set")]
    Missing(&'static str),
}

/// Settings for the identity provider client.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub client_id: String,
    pub client_secret: SecretString,
    pub auth_url: Url,
    pub token_url: Url,
    pub userinfo_url: Url,
    /// The callback address registered with the provider.
    pub redirect_url: Url,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub provider: ProviderConfig,
    pub session_secret: SecretString,
    pub bind_addr: SocketAddr,
    pub cookie_secure: bool,
}

impl Config {
    /// Loads `.env`, if there is one, and reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(err) = dotenvy::dotenv() {
            if !err.not_found() {
                tracing::warn!(err = %err, "could not load .env file");
            }
        }

        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let string = |var: &str| lookup(var).unwrap_or_default();

        let url = |var: &'static str, default: &str| {
            let value = lookup(var).unwrap_or_else(|| default.to_owned());
            Url::parse(&value).map_err(|source| ConfigError::Url { var, source })
        };

        let callback_base_url = url("CALLBACK_BASE_URL", DEFAULT_CALLBACK_BASE_URL)?;
        let redirect_url = callback_base_url
            .join(CALLBACK_PATH)
            .map_err(|source| ConfigError::Url {
                var: "CALLBACK_BASE_URL",
                source,
            })?;

        let provider = ProviderConfig {
            client_id: string("GOOGLE_CLIENT_ID"),
            client_secret: SecretString::new(string("GOOGLE_CLIENT_SECRET")),
            auth_url: url("GOOGLE_AUTH_URL", GOOGLE_AUTH_URL)?,
            token_url: url("GOOGLE_TOKEN_URL", GOOGLE_TOKEN_URL)?,
            userinfo_url: url("GOOGLE_USERINFO_URL", GOOGLE_USERINFO_URL)?,
            redirect_url,
        };

        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_owned());
        let bind_addr = bind_addr.parse().map_err(|_| ConfigError::Addr {
            var: "BIND_ADDR",
            value: bind_addr.clone(),
        })?;

        let cookie_secure = match lookup("COOKIE_SECURE").as_deref() {
            None | Some("") | Some("false") => false,
            Some("true") => true,
            Some(value) => {
                return Err(ConfigError::Bool {
                    var: "COOKIE_SECURE",
                    value: value.to_owned(),
                })
            }
        };

        Ok(Self {
            provider,
            session_secret: SecretString::new(string("SESSION_SECRET")),
            bind_addr,
            cookie_secure,
        })
    }

    /// Lists the credentials that were not provided.
    ///
    /// The server starts regardless, but the login flow cannot work without
    /// provider credentials, and without a session secret cookies are signed
    /// with an empty key.
    pub fn warnings(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.provider.client_id.is_empty() {
            warnings.push(ConfigWarning::Missing("GOOGLE_CLIENT_ID"));
        }

        if self.provider.client_secret.expose_secret().is_empty() {
            warnings.push(ConfigWarning::Missing("GOOGLE_CLIENT_SECRET"));
        }

        if self.session_secret.expose_secret().is_empty() {
            warnings.push(ConfigWarning::Missing("SESSION_SECRET"));
        }

        warnings
    }
}
