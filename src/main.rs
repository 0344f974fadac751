use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tower_http::cors::CorsLayer;
use tracing_appender::non_blocking::WorkerGuard;

use fit_onboard::catalog::{Catalog, RemoteCatalog};
use fit_onboard::config::AppConfig;
use fit_onboard::hydration::HydrationLog;
use fit_onboard::onboarding::sessions::spawn_idle_sweep;
use fit_onboard::onboarding::{
    LibSqlProgressStore, OnboardingRouteState, SessionRegistry, SystemClock, onboarding_routes,
};
use fit_onboard::store::{Database, LibSqlBackend};

fn init_tracing(config: &AppConfig) -> Option<WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "fit-onboard.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("Invalid configuration")?;
    let _log_guard = init_tracing(&config);

    eprintln!("🏋️ Fit Onboard v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   API: http://0.0.0.0:{}/api/onboarding/sessions", config.port);
    eprintln!("   BMR equation: {}", config.calculators.bmr_equation);

    // ── Database ─────────────────────────────────────────────────────────
    let db: Arc<dyn Database> = Arc::new(
        LibSqlBackend::new_local(&config.db_path)
            .await
            .with_context(|| format!("Failed to open database at {}", config.db_path.display()))?,
    );
    eprintln!("   Database: {}", config.db_path.display());

    // ── Catalog ──────────────────────────────────────────────────────────
    let catalog = Arc::new(Catalog::new());
    match &config.catalog_url {
        Some(url) => {
            let remote = RemoteCatalog::new(url.clone(), config.catalog_api_key.clone());
            match catalog.refresh(&remote).await {
                Ok(count) => eprintln!("   Catalog: {count} live sports from {url}"),
                Err(e) => {
                    tracing::warn!("Live catalog unavailable, using static sports: {e}");
                    eprintln!("   Catalog: static (live fetch failed)");
                }
            }
        }
        None => eprintln!("   Catalog: static"),
    }

    // ── Sessions ─────────────────────────────────────────────────────────
    let sessions = SessionRegistry::new(
        Arc::clone(&catalog),
        Arc::new(LibSqlProgressStore::new(Arc::clone(&db))),
        Arc::new(SystemClock),
        config.calculators,
    )
    .context("Onboarding flow definition is invalid")?;
    let sessions = Arc::new(sessions);

    // Spawn idle session sweep (runs every 60s)
    let _sweep_handle = spawn_idle_sweep(
        Arc::clone(&sessions),
        config.session_idle_timeout,
        Duration::from_secs(60),
    );
    eprintln!(
        "   Sessions: idle timeout {} min",
        config.session_idle_timeout.as_secs() / 60
    );

    let app = onboarding_routes(OnboardingRouteState {
        sessions,
        catalog,
        hydration: Arc::new(HydrationLog::new()),
        settings: config.calculators,
    })
    .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.port))?;
    tracing::info!(port = config.port, "Onboarding server started");
    axum::serve(listener, app).await?;
    Ok(())
}
