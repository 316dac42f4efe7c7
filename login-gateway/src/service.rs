use std::task::{Context, Poll};

use axum::http::{self, Request, Response};
use futures::future::BoxFuture;
use tower::{Layer, Service};
use tower_cookies::CookieManager;
use tower_sessions::{
    cookie::SameSite,
    service::{CookieController, PlaintextCookie, SignedCookie},
    Session, SessionManager, SessionManagerLayer, SessionStore,
};
use tracing::Instrument;

use crate::{key::SessionKey, AuthSession};

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "sid";

/// Session key the logged in user is stored under.
pub const DEFAULT_DATA_KEY: &str = "login_gateway.user";

/// A middleware that provides [`AuthSession`] as a request extension.
#[derive(Debug, Clone)]
pub struct AuthManager<S> {
    inner: S,
    data_key: &'static str,
}

impl<ReqBody, ResBody, S> Service<Request<ReqBody>> for AuthManager<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    ReqBody: Send + 'static,
    ResBody: Default + Send,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    #[inline]
    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let span = tracing::info_span!("call", user.id = tracing::field::Empty);

        let data_key = self.data_key;

        // Because the inner service can panic until ready, we need to ensure we only
        // use the ready service.
        //
        // See: https://docs.rs/tower/latest/tower/trait.Service.html#be-careful-when-cloning-inner-services
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(
            async move {
                let Some(session) = req.extensions().get::<Session>().cloned() else {
                    tracing::error!("session not found in request extensions");
                    return Ok(internal_server_error());
                };

                let auth_session = match AuthSession::from_session(session, data_key).await {
                    Ok(auth_session) => auth_session,
                    Err(err) => {
                        tracing::error!(err = %err, "could not create auth session from session");
                        return Ok(internal_server_error());
                    }
                };

                if let Some(ref user) = auth_session.user {
                    tracing::Span::current().record("user.id", user.provider_id.as_str());
                }

                req.extensions_mut().insert(auth_session);

                inner.call(req).await
            }
            .instrument(span),
        )
    }
}

fn internal_server_error<ResBody: Default>() -> Response<ResBody> {
    let mut res = Response::default();
    *res.status_mut() = http::StatusCode::INTERNAL_SERVER_ERROR;
    res
}

/// A layer for providing [`AuthSession`] as a request extension.
///
/// This combines the given session layer, which owns the session store, with
/// the resolution of the logged in user.
///
/// ```rust
/// use axum::{routing::get, Router};
/// use login_gateway::{signed_session_layer, AuthManagerLayer, MemoryStore, SessionKey};
///
/// let session_layer = signed_session_layer(MemoryStore::new(), &SessionKey::new(b"hunter42"), false);
///
/// let app: Router = Router::new()
///     .route("/", get(|| async {}))
///     .layer(AuthManagerLayer::new(session_layer));
/// ```
#[derive(Debug, Clone)]
pub struct AuthManagerLayer<Sessions: SessionStore, C: CookieController = PlaintextCookie> {
    session_manager_layer: SessionManagerLayer<Sessions, C>,
    data_key: &'static str,
}

impl<Sessions: SessionStore, C: CookieController> AuthManagerLayer<Sessions, C> {
    pub fn new(session_manager_layer: SessionManagerLayer<Sessions, C>) -> Self {
        Self {
            session_manager_layer,
            data_key: DEFAULT_DATA_KEY,
        }
    }

    /// Configures the session key the user is stored under. Defaults to
    /// "login_gateway.user".
    pub fn with_data_key(mut self, data_key: &'static str) -> Self {
        self.data_key = data_key;
        self
    }
}

impl<S, Sessions: SessionStore, C: CookieController> Layer<S> for AuthManagerLayer<Sessions, C> {
    type Service = CookieManager<SessionManager<AuthManager<S>, Sessions, C>>;

    fn layer(&self, inner: S) -> Self::Service {
        let auth_manager = AuthManager {
            inner,
            data_key: self.data_key,
        };

        self.session_manager_layer.layer(auth_manager)
    }
}

/// A session layer over the given store with a signed `sid` cookie.
///
/// The cookie is `HttpOnly`, scoped to `/` and `SameSite=Lax`, which ensures
/// it is sent along with the provider's redirect back to the callback. There
/// is no expiry: the cookie lasts for the browser session and the record as
/// long as the store keeps it.
pub fn signed_session_layer<Sessions: SessionStore>(
    store: Sessions,
    key: &SessionKey,
    secure: bool,
) -> SessionManagerLayer<Sessions, SignedCookie> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE)
        .with_http_only(true)
        .with_path("/")
        .with_same_site(SameSite::Lax)
        .with_secure(secure)
        .with_signed(key.cookie_key())
}
