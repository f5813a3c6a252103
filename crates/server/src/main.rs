//! Mutuelle-rs server entry point.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{Router, middleware};
use mutuelle_api::{middleware::AppState, router as api_router};
use mutuelle_common::{Config, LocalStorage};
use mutuelle_core::{
    ConversationService, DashboardService, GroupService, MessagingService, NoBenefits,
    NotificationService, StorageService,
};
use mutuelle_db::repositories::{
    AttachmentRepository, ConversationRepository, GroupRepository, MessageRepository,
    NotificationRepository, UserRepository,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mutuelle=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting mutuelle-rs server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = mutuelle_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    mutuelle_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let db = Arc::new(db);
    let user_repo = UserRepository::new(Arc::clone(&db));
    let conversation_repo = ConversationRepository::new(Arc::clone(&db));
    let message_repo = MessageRepository::new(Arc::clone(&db));
    let attachment_repo = AttachmentRepository::new(Arc::clone(&db));
    let notification_repo = NotificationRepository::new(Arc::clone(&db));
    let group_repo = GroupRepository::new(Arc::clone(&db));

    // Initialize file storage
    let storage = StorageService::new(Arc::new(LocalStorage::new(
        PathBuf::from(&config.storage.base_path),
        config.storage.base_url.clone(),
    )));

    // Initialize services
    let conversation_service =
        ConversationService::new(conversation_repo.clone(), user_repo.clone());
    let messaging_service = MessagingService::new(
        message_repo,
        attachment_repo,
        conversation_repo,
        conversation_service.clone(),
        storage.clone(),
        config.messaging.clone(),
    );
    let notification_service =
        NotificationService::new(notification_repo.clone(), user_repo.clone());
    let group_service = GroupService::new(
        group_repo,
        user_repo.clone(),
        storage,
        config.messaging.clone(),
    );
    let dashboard_service = DashboardService::new(notification_repo, Arc::new(NoBenefits));

    // Create app state
    let state = AppState {
        user_repo,
        conversation_service,
        messaging_service,
        notification_service,
        group_service,
        dashboard_service,
    };

    // Build router
    let app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            mutuelle_api::middleware::auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
