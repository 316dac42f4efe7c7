use std::fmt::Debug;

use async_trait::async_trait;
use dyn_clone::DynClone;
use oauth2::{
    basic::{BasicClient, BasicRequestTokenError},
    reqwest::async_http_client,
    url::Url,
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, RedirectUrl, Scope,
    TokenResponse, TokenUrl,
};
use secrecy::ExposeSecret;
use serde::Deserialize;

use crate::{
    config::{ConfigError, ProviderConfig},
    profile::Claims,
    UserProfile,
};

/// Scopes requested from the provider on every authorization redirect.
pub const SCOPES: [&str; 2] = ["profile", "email"];

/// The error type returned by the authorization code exchange.
pub type TokenExchangeError = BasicRequestTokenError<oauth2::reqwest::Error<reqwest::Error>>;

/// An error which ends a single authentication attempt.
///
/// None of these are retried; the route layer sends the user back to the
/// login page without any detail.
#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    /// The provider redirected back with an `error` parameter, e.g. because
    /// the user denied consent.
    #[error("provider reported an error: {error}")]
    Provider {
        error: String,
        description: Option<String>,
    },

    #[error("callback is missing the authorization code")]
    MissingCode,

    #[error(transparent)]
    TokenExchange(TokenExchangeError),

    /// The userinfo request failed or returned something other than a JSON
    /// object.
    #[error(transparent)]
    UserInfo(#[from] reqwest::Error),

    #[error("userinfo response has no subject claim")]
    MissingSubject,
}

/// Query parameters the provider appends to the callback URL.
///
/// Every field is optional so that any callback request can be parsed; what is
/// actually present decides between success and failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// A client of an external identity provider.
///
/// Providers perform the redirect based handshake: they produce the URL the
/// browser is sent to, and turn the parameters the browser comes back with
/// into a [`UserProfile`].
#[async_trait]
pub trait IdentityProvider: DynClone + Debug + Send + Sync + 'static {
    /// The provider's authorization endpoint, with client id, redirect URI and
    /// requested scopes filled in.
    fn authorize_url(&self) -> Url;

    /// Completes the handshake for a callback request.
    async fn authenticate(&self, params: CallbackParams) -> Result<UserProfile, AuthError>;
}

dyn_clone::clone_trait_object!(IdentityProvider);

/// Google's OAuth 2.0 endpoints, accessed with the authorization code flow.
#[derive(Debug, Clone)]
pub struct GoogleProvider {
    client: BasicClient,
    http_client: reqwest::Client,
    userinfo_url: Url,
}

impl GoogleProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self, ConfigError> {
        let client = BasicClient::new(
            ClientId::new(config.client_id.clone()),
            Some(ClientSecret::new(
                config.client_secret.expose_secret().to_owned(),
            )),
            AuthUrl::from_url(config.auth_url.clone()),
            Some(TokenUrl::from_url(config.token_url.clone())),
        )
        .set_redirect_uri(RedirectUrl::from_url(config.redirect_url.clone()));

        let http_client = reqwest::Client::builder()
            // Following redirects opens the client up to SSRF vulnerabilities.
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(ConfigError::HttpClient)?;

        Ok(Self {
            client,
            http_client,
            userinfo_url: config.userinfo_url.clone(),
        })
    }

    async fn fetch_claims(&self, access_token: &str) -> Result<Claims, reqwest::Error> {
        self.http_client
            .get(self.userinfo_url.clone())
            .bearer_auth(access_token)
            .send()
            .await?
            .error_for_status()?
            .json::<Claims>()
            .await
    }
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    fn authorize_url(&self) -> Url {
        // The state token is required by the protocol but is not checked on
        // the way back.
        let (url, _state) = self
            .client
            .authorize_url(CsrfToken::new_random)
            .add_scopes(SCOPES.iter().map(|scope| Scope::new(scope.to_string())))
            .url();

        url
    }

    #[tracing::instrument(level = "debug", skip_all, err)]
    async fn authenticate(&self, params: CallbackParams) -> Result<UserProfile, AuthError> {
        if let Some(error) = params.error {
            return Err(AuthError::Provider {
                error,
                description: params.error_description,
            });
        }

        let code = params.code.ok_or(AuthError::MissingCode)?;

        let token = self
            .client
            .exchange_code(AuthorizationCode::new(code))
            .request_async(async_http_client)
            .await
            .map_err(AuthError::TokenExchange)?;

        let claims = self.fetch_claims(token.access_token().secret()).await?;
        let profile = UserProfile::from_claims(claims)?;

        tracing::info!(user.id = %profile.provider_id, "user profile obtained from provider");

        Ok(profile)
    }
}
