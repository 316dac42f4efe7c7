use askama::Template;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::{Html, IntoResponse, Redirect},
    routing::get,
    Router,
};

use crate::{
    config::CALLBACK_PATH,
    provider::CallbackParams,
    web::{AppError, AppState},
    AuthSession,
};

pub const AUTH_PATH: &str = "/auth/google";

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub auth_path: &'static str,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(self::get::login))
        .route(AUTH_PATH, get(self::get::authorize))
        .route(CALLBACK_PATH, get(self::get::callback))
}

mod get {
    use super::*;

    pub async fn login() -> Result<Html<String>, AppError> {
        let page = LoginTemplate {
            auth_path: AUTH_PATH,
        }
        .render()?;

        Ok(Html(page))
    }

    pub async fn authorize(State(state): State<AppState>) -> impl IntoResponse {
        Redirect::to(state.provider.authorize_url().as_str())
    }

    pub async fn callback(
        mut auth_session: AuthSession,
        State(state): State<AppState>,
        query: Result<Query<CallbackParams>, QueryRejection>,
    ) -> Result<Redirect, AppError> {
        let Query(params) = match query {
            Ok(query) => query,
            Err(rejection) => {
                tracing::warn!(err = %rejection, "malformed callback query");
                return Ok(Redirect::to("/"));
            }
        };

        let user = match state.provider.authenticate(params).await {
            Ok(user) => user,
            Err(err) => {
                tracing::warn!(err = %err, "authentication failed");
                return Ok(Redirect::to("/"));
            }
        };

        auth_session.login(&user).await?;

        tracing::info!("login complete, redirecting to profile");

        Ok(Redirect::to("/profile"))
    }
}
