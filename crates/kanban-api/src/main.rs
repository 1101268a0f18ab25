//! Kanban API server entry point.

use std::sync::Arc;

use kanban_api::config::AppConfig;
use kanban_api::error::AppError;
use kanban_api::state::AppState;
use kanban_api::telemetry;
use kanban_boards::application::integration_events::integration_event_types;
use kanban_boards::application::registry::event_recorder;
use kanban_boards::application::service::BoardService;
use kanban_core::clock::{Clock, SystemClock};
use kanban_outbox::{OutboxDispatcher, TracingEventBus};
use kanban_store::{PgBoardReader, PgOutboxRepository, PgSessionFactory};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = AppConfig::from_env()?;
    let telemetry = telemetry::init(config.otlp_endpoint.as_deref())?;

    info!(
        otlp = telemetry.exports_spans(),
        "Starting Kanban API server"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!("../../migrations").run(&pool).await?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let service = BoardService::new(
        PgSessionFactory::new(pool.clone()),
        Arc::new(event_recorder()),
        Arc::clone(&clock),
    );
    let app_state = AppState::new(
        Arc::new(service),
        Arc::new(PgBoardReader::new(pool.clone())),
    );

    let shutdown = CancellationToken::new();
    let dispatcher = OutboxDispatcher::new(
        Arc::new(PgOutboxRepository::new(pool)),
        Arc::new(TracingEventBus),
        Arc::new(integration_event_types()),
        clock,
        config.dispatcher,
    )
    .spawn(shutdown.child_token());

    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "listening");

    axum::serve(listener, kanban_api::app(app_state))
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    // Let the dispatcher finish its current batch.
    shutdown.cancel();
    if let Err(err) = dispatcher.await {
        error!(error = %err, "outbox dispatcher task failed");
    }

    info!("Kanban API server stopped");
    telemetry.shutdown()
}

async fn shutdown_signal(token: CancellationToken) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => match result {
            Ok(()) => info!("received Ctrl-C, shutting down"),
            Err(err) => error!(error = %err, "failed to listen for Ctrl-C"),
        },
        () = token.cancelled() => {}
    }
}
