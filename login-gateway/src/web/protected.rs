use askama::Template;
use axum::{
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};

use crate::{
    web::{AppError, AppState},
    AuthSession,
};

#[derive(Template)]
#[template(path = "profile.html")]
struct ProfileTemplate<'a> {
    display_name: &'a str,
    logout_path: &'a str,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile", get(self::get::profile))
        .route("/logout", get(self::get::logout))
}

mod get {
    use super::*;

    pub async fn profile(auth_session: AuthSession) -> Result<Response, AppError> {
        // Also reachable without `login_required!`, e.g. when mounted elsewhere.
        let Some(user) = auth_session.user else {
            return Ok(Redirect::to("/").into_response());
        };

        let page = ProfileTemplate {
            display_name: &user.display_name,
            logout_path: "/logout",
        }
        .render()?;

        Ok(Html(page).into_response())
    }

    pub async fn logout(mut auth_session: AuthSession) -> Result<Redirect, AppError> {
        auth_session.logout().await?;
        Ok(Redirect::to("/"))
    }
}
