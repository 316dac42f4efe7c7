use crate::AuthSession;

/// Returns `true` when the request's session resolved to a stored user.
pub fn is_authenticated(auth_session: &AuthSession) -> bool {
    auth_session.is_authenticated()
}

/// Login predicate middleware.
///
/// Requires that the user is authenticated. Anonymous requests are redirected
/// to the login URL, which defaults to `/`. No error status is surfaced.
#[macro_export]
macro_rules! login_required {
    () => {
        $crate::login_required!(login_url = "/")
    };

    (login_url = $login_url:expr) => {{
        use $crate::axum::{
            extract::Request,
            middleware::{from_fn, Next},
            response::{IntoResponse, Redirect},
        };

        from_fn(
            |auth_session: $crate::AuthSession, req: Request, next: Next| async move {
                if $crate::is_authenticated(&auth_session) {
                    next.run(req).await
                } else {
                    Redirect::to($login_url).into_response()
                }
            },
        )
    }};
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header, Request, Response, StatusCode},
        routing::get,
        Router,
    };
    use serde_json::json;
    use tower::ServiceExt;
    use tower_sessions::service::SignedCookie;

    use crate::{
        signed_session_layer, AuthManagerLayer, AuthSession, MemoryStore, SessionKey, UserProfile,
    };

    fn user() -> UserProfile {
        UserProfile {
            display_name: "Ferris the Crab".to_string(),
            provider_id: "1".to_string(),
            raw_claims: json!({ "sub": "1", "email": "ferris@example.com" })
                .as_object()
                .cloned()
                .unwrap(),
        }
    }

    fn auth_layer(store: MemoryStore) -> AuthManagerLayer<MemoryStore, SignedCookie> {
        AuthManagerLayer::new(signed_session_layer(
            store,
            &SessionKey::new(b"hunter42"),
            false,
        ))
    }

    fn app(store: MemoryStore) -> Router {
        Router::new()
            .route("/", get(|| async {}))
            .route_layer(login_required!(login_url = "/login"))
            .route(
                "/login",
                get(|mut auth_session: AuthSession| async move {
                    auth_session.login(&user()).await.unwrap();
                }),
            )
            .route(
                "/logout",
                get(|mut auth_session: AuthSession| async move {
                    auth_session.logout().await.unwrap();
                }),
            )
            .route(
                "/debug",
                get(|auth_session: AuthSession| async move { format!("{auth_session:?}") }),
            )
            .layer(auth_layer(store))
    }

    fn get_session_cookie(res: &Response<Body>) -> Option<String> {
        res.headers()
            .get(header::SET_COOKIE)
            .and_then(|h| h.to_str().ok())
            .and_then(|cookie_str| cookie_str.split(';').next())
            .map(str::to_owned)
    }

    fn request(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_login_required() {
        let app = app(MemoryStore::new());

        let res = app.clone().oneshot(request("/", None)).await.unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            res.headers()
                .get(header::LOCATION)
                .and_then(|h| h.to_str().ok()),
            Some("/login")
        );

        let res = app.clone().oneshot(request("/login", None)).await.unwrap();
        let session_cookie =
            get_session_cookie(&res).expect("Response should have a valid session cookie");
        assert!(session_cookie.starts_with("sid="));

        let res = app
            .oneshot(request("/", Some(&session_cookie)))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_default_login_url() {
        let app: Router = Router::new()
            .route("/", get(|| async {}))
            .route_layer(login_required!())
            .layer(auth_layer(MemoryStore::new()));

        let res = app.oneshot(request("/", None)).await.unwrap();
        assert!(res.status().is_redirection());
        assert_eq!(
            res.headers()
                .get(header::LOCATION)
                .and_then(|h| h.to_str().ok()),
            Some("/")
        );
    }

    #[tokio::test]
    async fn test_tampered_cookie_is_anonymous() {
        let app = app(MemoryStore::new());

        let res = app.clone().oneshot(request("/login", None)).await.unwrap();
        let session_cookie = get_session_cookie(&res).unwrap();

        // The signature leads the cookie value.
        let value = session_cookie.trim_start_matches("sid=");
        let replacement = if value.starts_with('A') { 'B' } else { 'A' };
        let forged = format!("sid={replacement}{}", &value[1..]);

        let res = app.oneshot(request("/", Some(&forged))).await.unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn test_logout_destroys_session() {
        let store = MemoryStore::new();
        let app = app(store.clone());

        let res = app.clone().oneshot(request("/login", None)).await.unwrap();
        let session_cookie = get_session_cookie(&res).unwrap();
        assert_eq!(store.len().await, 1);

        let res = app
            .clone()
            .oneshot(request("/logout", Some(&session_cookie)))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(store.is_empty().await);

        // Logging out again is a no-op.
        let res = app
            .clone()
            .oneshot(request("/logout", Some(&session_cookie)))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let res = app
            .oneshot(request("/", Some(&session_cookie)))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn test_stale_cookie_is_removed() {
        let store = MemoryStore::new();
        let app = app(store.clone());

        let res = app.clone().oneshot(request("/login", None)).await.unwrap();
        let session_cookie = get_session_cookie(&res).unwrap();

        let res = app
            .clone()
            .oneshot(request("/logout", Some(&session_cookie)))
            .await
            .unwrap();
        let removal = res
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|h| h.to_str().ok())
            .unwrap();
        assert!(removal.contains("Max-Age=0"));

        // A browser that kept the cookie is told to drop it on its next visit,
        // even though the guard turns the request away.
        let res = app
            .oneshot(request("/", Some(&session_cookie)))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        let removal = res
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|h| h.to_str().ok())
            .expect("Stale session cookie should be removed");
        assert!(removal.starts_with("sid="));
        assert!(removal.contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn test_relogin_replaces_session() {
        let store = MemoryStore::new();
        let app = app(store.clone());

        let res = app.clone().oneshot(request("/login", None)).await.unwrap();
        let first = get_session_cookie(&res).unwrap();

        let res = app
            .clone()
            .oneshot(request("/login", Some(&first)))
            .await
            .unwrap();
        let second = get_session_cookie(&res).unwrap();

        assert_ne!(first, second);
        assert_eq!(store.len().await, 1);

        let res = app.oneshot(request("/", Some(&first))).await.unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn test_debug_output_hides_claims() {
        let store = MemoryStore::new();
        let app = app(store.clone());

        let res = app.clone().oneshot(request("/login", None)).await.unwrap();
        let session_cookie = get_session_cookie(&res).unwrap();

        let res = app
            .oneshot(request("/debug", Some(&session_cookie)))
            .await
            .unwrap();
        let body = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains("Ferris the Crab"));
        assert!(!body.contains("ferris@example.com"));

        let layer = format!("{:?}", auth_layer(store));
        assert!(!layer.contains("ferris@example.com"));
        assert!(!layer.contains("Ferris the Crab"));
    }
}
