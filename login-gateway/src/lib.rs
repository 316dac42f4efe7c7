//! Delegated sign-in with server-side sessions for Axum.
//!
//! This crate is a small web server that lets users sign in with an external
//! identity provider (Google, via the OAuth 2.0 authorization code flow) and
//! then remembers them with a server-side session. It covers:
//!
//! 1. Sending the browser to the provider's consent screen,
//! 2. Turning the provider's callback into a [`UserProfile`],
//! 3. Keeping that profile in a session named by a signed cookie,
//! 4. Protecting routes so that only logged in users reach them.
//!
//! # Sessions
//!
//! Sessions are kept by a [`tower_sessions::SessionStore`], which maps opaque
//! session ids to user profiles. [`MemoryStore`] keeps them in process memory;
//! nothing expires, a session lives until logout or restart. The store is
//! handed to the session layer explicitly rather than living in a global.
//!
//! [`signed_session_layer`] names each session with a cookie signed by a
//! [`SessionKey`]. [`AuthManagerLayer`] sits on top of it and provides an
//! [`AuthSession`] as a request extension. Handlers use it to log users in and
//! out.
//!
//! # Providers
//!
//! Anything that implements [`IdentityProvider`] can be used to authenticate.
//! [`GoogleProvider`] is the one the server ships with.
//!
//! # Example
//!
//! ```rust,no_run
//! use axum::{response::IntoResponse, routing::get, Router};
//! use login_gateway::{
//!     login_required, signed_session_layer, AuthManagerLayer, AuthSession, MemoryStore, SessionKey,
//! };
//!
//! async fn profile_handler(auth_session: AuthSession) -> impl IntoResponse {
//!     match auth_session.user {
//!         Some(user) => format!("Logged in as: {}", user.display_name),
//!         None => String::new(),
//!     }
//! }
//!
//! async fn logout_handler(mut auth_session: AuthSession) {
//!     auth_session.logout().await.unwrap();
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let session_layer = signed_session_layer(MemoryStore::new(), &SessionKey::new(b"hunter42"), false);
//!
//!     let app = Router::new()
//!         .route("/profile", get(profile_handler))
//!         .route("/logout", get(logout_handler))
//!         .route_layer(login_required!(login_url = "/"))
//!         .layer(AuthManagerLayer::new(session_layer));
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```

#![deny(missing_debug_implementations, unsafe_code)]

mod key;
mod memory_store;
mod middleware;
mod profile;
mod service;
mod session;

pub mod config;
pub mod provider;
pub mod web;

pub use axum;
pub use tower_sessions;
pub use key::SessionKey;
pub use memory_store::MemoryStore;
pub use middleware::is_authenticated;
pub use profile::{Claims, UserProfile};
pub use provider::{AuthError, CallbackParams, GoogleProvider, IdentityProvider};
pub use service::{signed_session_layer, AuthManager, AuthManagerLayer};
pub use session::{AuthSession, Error};
pub use web::App;
