use std::sync::Arc;

use anyhow::Context;

use signup_flow::api::{HttpRegistrationApi, RegistrationApi};
use signup_flow::config::AppConfig;
use signup_flow::sessions::{self, SessionStore};
use signup_flow::web::{AppState, signup_routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env().context("Invalid SIGNUP_* configuration")?;

    eprintln!("📝 signup-flow v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Service: {}", config.api.base_url);
    eprintln!(
        "   Flow: status check {}, email verification {}, consent {}, phone {:?}",
        on_off(config.flow.status_check),
        on_off(config.flow.verify_email),
        on_off(config.flow.consent_required),
        config.flow.phone_source,
    );
    eprintln!("   API: http://0.0.0.0:{}/api/sessions", config.port);
    eprintln!(
        "   Idle sessions expire after {}s\n",
        config.session_idle_timeout.as_secs()
    );

    let api: Arc<dyn RegistrationApi> = Arc::new(HttpRegistrationApi::new(config.api.clone()));
    let store = SessionStore::new(config.session_idle_timeout);
    let _expiry_handle = sessions::spawn_expiry_task(Arc::clone(&store));

    let app = signup_routes(AppState {
        sessions: store,
        api,
        flow: config.flow,
    });

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.port))?;
    tracing::info!(port = config.port, "Signup server started");
    axum::serve(listener, app).await?;

    Ok(())
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "on" } else { "off" }
}
