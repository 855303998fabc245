use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use bridal_rental::api;
use bridal_rental::clock::SystemClock;
use bridal_rental::config::{Config, SandboxMode};
use bridal_rental::db::Db;
use bridal_rental::metrics::Metrics;
use bridal_rental::payment::{PaymentAdapter, SandboxPaymentAdapter};
use bridal_rental::Engine;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG overrides the default filter
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,bridal_rental=debug")),
        )
        .init();

    let config = Config::load().unwrap_or_else(|e| e.exit());

    tracing::info!("🚀 Starting bridal rental service");
    tracing::info!(
        database = %config.database_url,
        overlap_policy = ?config.overlap_policy,
        sandbox_payments = ?config.sandbox_payments,
        "Configuration loaded"
    );

    // === 1. Metrics ===
    let metrics = Arc::new(Metrics::new()?);
    tracing::info!("📊 Metrics registry created with {} metrics", metrics.registry().gather().len());

    // === 2. Storage ===
    let db = Db::connect(&config.database_url, config.db_max_connections).await?;
    tracing::info!("✅ Database ready");

    // === 3. Payments ===
    let adapter: Arc<dyn PaymentAdapter> = Arc::new(match config.sandbox_payments {
        SandboxMode::Approve => SandboxPaymentAdapter::approving(),
        SandboxMode::Decline => SandboxPaymentAdapter::declining("sandbox declined"),
        SandboxMode::Unavailable => SandboxPaymentAdapter::unavailable(),
    });

    // === 4. Engine ===
    let engine = Engine::new(
        db,
        &config.engine_config(),
        adapter,
        Arc::new(SystemClock),
        metrics,
    );
    let data = web::Data::new(engine);

    tracing::info!("🌐 Listening on http://{}", config.listen);
    HttpServer::new(move || App::new().app_data(data.clone()).configure(api::configure))
        .bind(config.listen.as_str())?
        .run()
        .await?;

    tracing::info!("👋 Shutdown complete");
    Ok(())
}
