use std::fmt;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts, http::StatusCode};
use tower_sessions::{session, Session};

use crate::UserProfile;

/// An error type which maps session errors.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A mapping to `tower_sessions::session::Error'.
    #[error(transparent)]
    Session(#[from] session::Error),
}

/// The authentication state of a single request.
///
/// An `AuthSession` is installed as a request extension by
/// [`AuthManagerLayer`](crate::AuthManagerLayer) and may be extracted in
/// handlers. `user` is `Some` exactly when the request carried a validly signed
/// cookie naming a live session.
///
/// The session store plays the part of a map from session id to user:
///
/// 1. [`login`](Self::login) creates an entry under a fresh session id and
///    hands the browser a cookie for it,
/// 2. the session layer gets the entry back on every later request,
/// 3. [`logout`](Self::logout) destroys the entry and removes the cookie.
#[derive(Clone)]
pub struct AuthSession {
    /// The user associated with the session. `None` when not logged in.
    pub user: Option<UserProfile>,

    session: Session,
    data_key: &'static str,
}

impl AuthSession {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Stores the user in the session.
    ///
    /// The session id is always cycled first, so the browser never keeps a
    /// session id across a login and any session it was already logged in with
    /// is destroyed.
    #[tracing::instrument(level = "debug", skip_all, fields(user.id = %user.provider_id), ret, err)]
    pub async fn login(&mut self, user: &UserProfile) -> Result<(), Error> {
        self.session.cycle_id().await?; // Session-fixation mitigation.
        self.session.insert(self.data_key, user).await?;

        self.user = Some(user.clone());

        Ok(())
    }

    /// Destroys the session, which also removes the session cookie.
    ///
    /// Logging out an anonymous session does nothing, so this may safely be
    /// called more than once.
    #[tracing::instrument(level = "debug", skip_all, fields(user.id), ret, err)]
    pub async fn logout(&mut self) -> Result<Option<UserProfile>, Error> {
        let user = self.user.take();

        if let Some(ref user) = user {
            tracing::Span::current().record("user.id", user.provider_id.as_str());
        }

        self.session.flush().await?;

        Ok(user)
    }

    pub(crate) async fn from_session(session: Session, data_key: &'static str) -> Result<Self, Error> {
        let user = session.get::<UserProfile>(data_key).await?;

        Ok(Self {
            user,
            session,
            data_key,
        })
    }
}

// The underlying session caches its whole record, so only the user is shown.
impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession")
            .field("user", &self.user)
            .field("data_key", &self.data_key)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthSession
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<AuthSession>().cloned().ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Can't extract auth session. Is `AuthManagerLayer` enabled?",
        ))
    }
}
