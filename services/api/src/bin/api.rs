//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{BroadcastNotifier, NullNotifier, PgStore},
    config::Config,
    error::ApiError,
    web::{
        middleware::require_identity,
        rest::{
            active_lectures_handler, add_clarification_handler, clear_questions_handler,
            create_question_handler, delete_question_handler, end_lecture_handler,
            list_questions_handler, my_lectures_handler, start_lecture_handler,
            update_question_handler, ApiDoc,
        },
        state::AppState,
        ws_handler,
    },
};
use axum::{
    http::{
        header::{HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE},
        Method,
    },
    middleware as axum_middleware,
    routing::{delete, get, patch, post},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use vidya_core::ports::Notifier;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let store = Arc::new(PgStore::new(db_pool.clone()));
    info!("Running database migrations...");
    store.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Pick the Fan-out Transport ---
    // The notifier is built here and injected into AppState; handlers never
    // reach for a global socket registry.
    let notifier: Arc<dyn Notifier> = if config.realtime {
        info!("Realtime fan-out enabled (socket broadcast).");
        Arc::new(BroadcastNotifier::new())
    } else {
        info!("Realtime fan-out disabled; clients poll the list endpoints.");
        Arc::new(NullNotifier)
    };

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState::new(store, notifier, config.clone()));

    let allowed_origin = config
        .allowed_origin
        .parse::<HeaderValue>()
        .map_err(|e| ApiError::Internal(format!("Invalid ALLOWED_ORIGIN: {}", e)))?;
    let cors = CorsLayer::new()
        .allow_origin(allowed_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            CONTENT_TYPE,
            ACCEPT,
            HeaderName::from_static("x-user-id"),
            HeaderName::from_static("x-user-name"),
            HeaderName::from_static("x-user-role"),
        ]);

    // --- 5. Create the Web Router ---
    // Public routes (students discover joinable sessions before any identity
    // headers are attached)
    let public_routes = Router::new().route("/api/lectures/active", get(active_lectures_handler));

    // Protected routes (identity headers required)
    let protected_routes = Router::new()
        .route("/api/lectures/start", post(start_lecture_handler))
        .route("/api/lectures/end", post(end_lecture_handler))
        .route("/api/lectures/mine", get(my_lectures_handler))
        .route(
            "/api/questions",
            post(create_question_handler)
                .get(list_questions_handler)
                .delete(clear_questions_handler),
        )
        .route(
            "/api/questions/{id}",
            patch(update_question_handler).delete(delete_question_handler),
        )
        .route(
            "/api/questions/{id}/clarification",
            post(add_clarification_handler),
        )
        .route("/ws", get(ws_handler))
        .layer(axum_middleware::from_fn(require_identity));

    // Combine API routes
    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
