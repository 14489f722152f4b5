//! Marketpay service entrypoint.
//!
//! Wires configuration, stores, the payment gateway, the HTTP API, and the
//! auto-release scheduler, then serves until SIGINT.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use marketpay::adapters::events::RedisEventPublisher;
use marketpay::adapters::gateway::{MockGateway, StripeGateway, StripeGatewayConfig};
use marketpay::adapters::http::{billing_router, BillingAppState};
use marketpay::adapters::orders::HttpOrderNotifier;
use marketpay::adapters::postgres::{
    PostgresDisputeLookup, PostgresEscrowHoldRepository, PostgresPaymentRepository,
    PostgresPayoutAccountReader, PostgresRefundRepository, PostgresSettlementRepository,
};
use marketpay::application::AutoReleaseSweepHandler;
use marketpay::config::AppConfig;
use marketpay::ports::PaymentGateway;
use marketpay::scheduler::{AutoReleaseScheduler, AutoReleaseSchedulerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level)),
        )
        .init();

    tracing::info!(
        environment = ?config.server.environment,
        "Starting marketpay"
    );

    // Database
    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        tracing::info!("Running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;
    }

    // Redis (event fan-out)
    let redis_client = redis::Client::open(config.redis.url.as_str())?;
    let redis_conn = redis_client.get_multiplexed_tokio_connection().await?;
    let event_publisher = Arc::new(RedisEventPublisher::new(redis_conn));

    // Payment gateway
    let gateway: Arc<dyn PaymentGateway> = if config.gateway.is_mock() {
        tracing::warn!("Using mock payment gateway; no real money moves");
        Arc::new(MockGateway::new())
    } else {
        let mut gateway_config =
            StripeGatewayConfig::new(&config.gateway.api_key, &config.gateway.webhook_secret)
                .with_require_livemode(config.gateway.require_livemode)
                .with_timeout(Duration::from_secs(config.gateway.timeout_secs));
        if let Some(base_url) = &config.gateway.api_base_url {
            gateway_config = gateway_config.with_base_url(base_url);
        }
        Arc::new(StripeGateway::new(gateway_config))
    };

    // Application state
    let state = BillingAppState {
        payments: Arc::new(PostgresPaymentRepository::new(pool.clone())),
        holds: Arc::new(PostgresEscrowHoldRepository::new(pool.clone())),
        settlements: Arc::new(PostgresSettlementRepository::new(pool.clone())),
        refunds: Arc::new(PostgresRefundRepository::new(pool.clone())),
        payout_accounts: Arc::new(PostgresPayoutAccountReader::new(pool.clone())),
        gateway,
        event_publisher,
        order_notifier: Arc::new(HttpOrderNotifier::new(
            &config.orders.base_url,
            Duration::from_secs(config.orders.timeout_secs),
        )),
        disputes: Arc::new(PostgresDisputeLookup::new(pool.clone())),
        auto_release_days: config.escrow.auto_release_days,
    };

    // Background sweep
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweep_handler = Arc::new(AutoReleaseSweepHandler::new(
        state.holds.clone(),
        state.disputes.clone(),
        Arc::new(state.release_handler()),
    ));
    let scheduler = AutoReleaseScheduler::with_config(
        sweep_handler,
        AutoReleaseSchedulerConfig::default().with_sweep_interval(config.escrow.sweep_interval()),
    );
    let scheduler_task = tokio::spawn(async move { scheduler.run(shutdown_rx).await });

    // HTTP server
    let app = Router::new()
        .nest("/api/v1", billing_router())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(CorsLayer::permissive());

    let addr = config.server.socket_addr()?;
    tracing::info!(%addr, "Listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await?;

    let _ = shutdown_tx.send(true);
    let _ = scheduler_task.await;

    tracing::info!("Stopped");
    Ok(())
}
