//! Run with
//!
//! ```not_rust
//! GOOGLE_CLIENT_ID=xxx GOOGLE_CLIENT_SECRET=yyy SESSION_SECRET=zzz cargo run
//! ```
//!
//! Or put the same variables in a `.env` file.

use login_gateway::{config::Config, App};
use secrecy::ExposeSecret;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    tracing_subscriber::registry()
        .with(EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(
            |_| "login_gateway=debug,tower_http=debug".into(),
        )))
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    let config = Config::from_env()?;

    tracing::info!(
        client_id = %config.provider.client_id,
        client_secret = if config.provider.client_secret.expose_secret().is_empty() {
            "missing"
        } else {
            "loaded"
        },
        redirect_url = %config.provider.redirect_url,
        "server starting"
    );

    // Missing credentials are reported but do not stop the server.
    for warning in config.warnings() {
        tracing::warn!(%warning, "configuration incomplete");
    }

    App::from_config(&config)?.serve(config.bind_addr).await
}
