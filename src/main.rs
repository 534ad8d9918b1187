use tracing_subscriber::EnvFilter;
use userbase::{app, users::services::ensure_admin_seed, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    init_tracing();

    let app_state = AppState::init().await?;

    if let Some(seed) = &app_state.config.admin_seed {
        ensure_admin_seed(&app_state.db, seed)
            .await
            .map_err(|e| anyhow::anyhow!("seed admin account: {e}"))?;
    }

    app::serve(app::build_app(app_state)).await
}

/// Text logs by default; `LOG_FORMAT=json` switches to one JSON object per line.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("userbase=debug,axum=info,tower_http=info"));
    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().with_current_span(true).init();
    } else {
        builder.with_target(false).init();
    }
}
