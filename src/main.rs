use actix::Actor;
use actix_web::dev::Service as _;
use actix_web::{web, App, HttpServer};
use std::sync::Arc;
use tokio::time::Duration;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod actors;
mod config;
mod db;
mod domain;
mod http;
mod metrics;
mod notify;
mod shipping;
mod store;
mod utils;

use actors::{CoordinatorActor, WorkerSettings};
use config::AppConfig;
use http::AppState;
use notify::{Mailer, SmtpMailer};
use shipping::{CourierClient, TokenProvider};
use store::{
    ApiTokenStore, NotificationStore, OrderStore, OutboxStore, PaymentStore, ProductStore,
    PromoStore, SessionStore, TicketStore, VendorStore,
};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Structured logging with environment-based filtering; override with
    // RUST_LOG, e.g. RUST_LOG=debug cargo run
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,marketplace_api=debug")),
        )
        .init();

    tracing::info!("Starting marketplace API");

    let config = AppConfig::from_env()?;

    // === 1. Database ===
    let pool = db::connect(&config).await?;
    db::ensure_schema(&pool).await?;

    // === 2. Metrics + ops server ===
    let metrics = Arc::new(metrics::Metrics::new()?);
    let metrics_registry = Arc::new(metrics.registry().clone());
    let metrics_port = config.metrics_port;
    actix_web::rt::spawn(async move {
        if let Err(e) = metrics::start_metrics_server(metrics_registry, metrics_port).await {
            tracing::error!("Metrics server error: {}", e);
        }
    });

    // === 3. Stores ===
    let orders = OrderStore::new(pool.clone());
    let vendors = VendorStore::new(pool.clone());
    let products = ProductStore::new(pool.clone());
    let payments = PaymentStore::new(pool.clone());
    let promos = PromoStore::new(pool.clone());
    let tickets = TicketStore::new(pool.clone());
    let notifications = NotificationStore::new(pool.clone());
    let outbox = OutboxStore::new(pool.clone());
    let sessions = SessionStore::new(pool.clone());
    let api_tokens = ApiTokenStore::new(pool.clone());

    // === 4. External collaborators ===
    let token_provider = Arc::new(TokenProvider::new(
        reqwest::Client::new(),
        config.courier_auth_url.clone(),
        config.courier_api_key.clone(),
        config.courier_api_secret.clone(),
        api_tokens,
    ));
    let courier = Arc::new(CourierClient::new(
        config.courier_base_url.clone(),
        token_provider.clone(),
    ));
    let mailer: Arc<dyn Mailer> = Arc::new(SmtpMailer::new(
        &config.smtp_host,
        &config.smtp_username,
        &config.smtp_password,
        &config.smtp_from,
    )?);

    // === 5. Background workers ===
    let settings = WorkerSettings {
        relay_poll_interval: Duration::from_secs(config.relay_poll_interval_secs),
        relay_batch_size: config.relay_batch_size,
        relay_max_attempts: config.relay_max_attempts,
        tracking_poll_interval: Duration::from_secs(config.tracking_poll_interval_secs),
        tracking_batch_size: config.tracking_batch_size,
        token_refresh_interval: Duration::from_secs(config.token_refresh_interval_secs),
    };

    let _coordinator = CoordinatorActor::new(
        orders.clone(),
        outbox.clone(),
        notifications.clone(),
        sessions.clone(),
        courier.clone(),
        token_provider,
        mailer,
        metrics.clone(),
        settings,
    )
    .start();

    // === 6. HTTP API ===
    let state = web::Data::new(AppState {
        orders,
        vendors,
        products,
        payments,
        promos,
        tickets,
        notifications,
        outbox,
        sessions,
        courier,
        metrics: metrics.clone(),
    });

    let bind_addr = config.bind_addr.clone();
    tracing::info!(bind_addr = %bind_addr, "Starting HTTP server");

    let request_metrics = metrics.clone();
    HttpServer::new(move || {
        let request_metrics = request_metrics.clone();
        App::new()
            .app_data(state.clone())
            .wrap_fn(move |req, srv| {
                let request_metrics = request_metrics.clone();
                let fut = srv.call(req);
                async move {
                    let res = fut.await?;
                    let route = res
                        .request()
                        .match_pattern()
                        .unwrap_or_else(|| res.request().path().to_string());
                    request_metrics.record_http_request(&route, res.status().as_u16());
                    Ok(res)
                }
            })
            .configure(http::configure)
    })
    .bind(bind_addr)?
    .run()
    .await?;

    Ok(())
}
