//! HTTP routes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{provider::IdentityProvider, session};

pub use app::App;

mod app;
mod auth;
mod protected;

/// Shared state for route handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub provider: Box<dyn IdentityProvider>,
}

/// Failures that reach the generic error handler.
///
/// Authentication failures never end up here; they redirect to the login
/// page instead.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Session(#[from] session::Error),

    #[error(transparent)]
    Render(#[from] askama::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(err = %self, "request failed");
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }
}
