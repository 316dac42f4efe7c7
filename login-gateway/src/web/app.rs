use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tower_sessions::{service::SignedCookie, SessionManagerLayer};

use crate::{
    config::{Config, ConfigError},
    key::SessionKey,
    provider::{GoogleProvider, IdentityProvider},
    service::signed_session_layer,
    web::{auth, protected, AppState},
    AuthManagerLayer, MemoryStore,
};

/// The assembled web server.
///
/// The provider and the session layer (and with it the session store) are
/// supplied by the caller, so tests can swap in their own.
#[derive(Debug)]
pub struct App {
    provider: Box<dyn IdentityProvider>,
    session_layer: SessionManagerLayer<MemoryStore, SignedCookie>,
}

impl App {
    pub fn new(
        provider: impl IdentityProvider,
        session_layer: SessionManagerLayer<MemoryStore, SignedCookie>,
    ) -> Self {
        Self {
            provider: Box::new(provider),
            session_layer,
        }
    }

    /// Builds the production server: Google as provider and an in-memory
    /// session store.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let provider = GoogleProvider::new(&config.provider)?;

        // Session layer.
        //
        // Sessions live in process memory and are named by a signed cookie.
        let session_layer = signed_session_layer(
            MemoryStore::new(),
            &SessionKey::from_secret(&config.session_secret),
            config.cookie_secure,
        );

        Ok(Self::new(provider, session_layer))
    }

    pub fn router(&self) -> Router {
        let state = AppState {
            provider: self.provider.clone(),
        };

        protected::router()
            .route_layer(crate::login_required!())
            .merge(auth::router())
            .with_state(state)
            .layer(TraceLayer::new_for_http())
            .layer(AuthManagerLayer::new(self.session_layer.clone()))
    }

    pub async fn serve(self, addr: SocketAddr) -> eyre::Result<()> {
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("server is running on http://{}", listener.local_addr()?);

        axum::serve(listener, self.router()).await?;

        Ok(())
    }
}
