//! Payment Fanout - Main Entry Point
//!
//! Verifies payment provider webhooks and fans them out to live WebSocket
//! subscribers.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

use payment_fanout::adapters::events::RedisEventChannel;
use payment_fanout::adapters::http::{app_router, WebhookAppState};
use payment_fanout::adapters::registry::RedisConnectionRegistry;
use payment_fanout::adapters::websocket::{ConnectionHub, WebSocketState};
use payment_fanout::application::{
    Broadcaster, BroadcasterConfig, ConnectionLifecycle, WebhookIngestHandler,
};
use payment_fanout::config::{AppConfig, ServerConfig};
use payment_fanout::ports::{ConnectionRegistry, EventHandler, EventSubscriber};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const RESUBSCRIBE_DELAY: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = AppConfig::load()?;
    init_tracing(&config.server);
    config.validate()?;

    let instance_id = config.server.instance_id();
    info!(
        version = env!("CARGO_PKG_VERSION"),
        instance_id = %instance_id,
        environment = ?config.server.environment,
        "Starting payment fanout"
    );

    let verifier = Arc::new(config.webhook.verifier()?);
    info!(mode = verifier.mode().name(), "Webhook verification configured");

    // Redis
    let client = redis::Client::open(config.redis.url.as_str())?;
    let conn = tokio::time::timeout(
        config.redis.timeout(),
        client.get_multiplexed_async_connection(),
    )
    .await
    .map_err(|_| "timed out connecting to Redis")??;

    let channel = Arc::new(RedisEventChannel::new(
        client,
        conn.clone(),
        &config.broadcast.channel,
    ));
    let registry: Arc<dyn ConnectionRegistry> = Arc::new(
        RedisConnectionRegistry::new(conn, &config.broadcast.registry_prefix, instance_id)
            .with_ttl(config.broadcast.registry_ttl()),
    );
    let hub = Arc::new(ConnectionHub::new(config.broadcast.send_buffer));

    // Application
    let broadcaster: Arc<dyn EventHandler> = Arc::new(Broadcaster::with_config(
        registry.clone(),
        hub.clone(),
        BroadcasterConfig::default().with_pass_timeout(config.broadcast.pass_timeout()),
    ));
    let ingest = Arc::new(WebhookIngestHandler::new(verifier, channel.clone()));
    let lifecycle = Arc::new(ConnectionLifecycle::new(registry));

    // Subscriber loop
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let subscriber_task = tokio::spawn(run_subscriber(channel, broadcaster, shutdown_rx));

    // HTTP
    let app = app_router(
        WebhookAppState::new(ingest),
        WebSocketState::new(hub, lifecycle)
            .with_refresh_interval(config.broadcast.registry_refresh_interval()),
        config.server.request_timeout(),
    );
    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    subscriber_task.await?;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(server: &ServerConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&server.log_level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if server.is_production() {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}

/// Keeps the broadcaster subscribed until shutdown, resubscribing after
/// channel failures.
async fn run_subscriber(
    channel: Arc<RedisEventChannel>,
    handler: Arc<dyn EventHandler>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        match channel.run(handler.clone(), shutdown.clone()).await {
            Ok(()) => return,
            Err(e) => {
                tracing::error!(error = %e, channel = channel.channel(), "Event subscriber failed");
            }
        }

        tokio::select! {
            _ = shutdown.changed() => return,
            _ = tokio::time::sleep(RESUBSCRIBE_DELAY) => {}
        }
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal, cleaning up..."),
        Err(e) => {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    }
}
