//! services/studio/src/bin/studio.rs

use async_openai::{config::OpenAIConfig, Client};
use axum::http::{
    header::{ACCEPT, CONTENT_TYPE},
    HeaderValue, Method,
};
use axum::Router;
use freeplotter_core::ports::PromptService;
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use studio_lib::{
    adapters::{
        FilePreferences, HtmlOutlineRenderer, OpenAiPromptAdapter, RemoteApiAdapter,
        SqliteStoryStore,
    },
    config::{Config, ConfigError},
    error::AppError,
    web::{self, rest::ApiDoc, AppState, Ports},
};
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting studio...");

    // --- 2. Open the Story Database & Run Migrations ---
    info!("Opening story database at {}", config.database_url);
    let db_pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let story_store = Arc::new(SqliteStoryStore::new(db_pool));
    info!("Running database migrations...");
    story_store.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize Service Adapters ---
    let preferences = Arc::new(FilePreferences::new(config.preferences_path.clone()));
    let remote = Arc::new(RemoteApiAdapter::new(
        &config.api_url,
        config.request_timeout,
        preferences.clone(),
    )?);

    let prompts: Arc<dyn PromptService> = match &config.openai_api_key {
        Some(api_key) => {
            info!("Using OpenAI model {} for questions.", config.prompt_model);
            let openai_client = Client::with_config(OpenAIConfig::new().with_api_key(api_key));
            Arc::new(OpenAiPromptAdapter::new(
                openai_client,
                config.prompt_model.clone(),
            ))
        }
        None => remote.clone(),
    };

    // --- 4. Build the Shared AppState ---
    let ports = Ports {
        stories: story_store,
        preferences,
        prompts,
        showing: remote.clone(),
        outlines: remote.clone(),
        licenses: remote.clone(),
        orders: remote,
        renderer: Arc::new(HtmlOutlineRenderer::new()),
    };
    let app_state = Arc::new(AppState::restore(ports, config.clone()).await?);
    let shutdown = app_state.shutdown.clone();

    // --- 5. Create the Web Router ---
    let allowed_origin = config.allowed_origin.parse::<HeaderValue>().map_err(|e| {
        ConfigError::InvalidValue("ALLOWED_ORIGIN".to_string(), e.to_string())
    })?;
    let cors = CorsLayer::new()
        .allow_origin(allowed_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    let app = Router::new()
        .merge(web::router(app_state).layer(cors))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutdown requested, abandoning in-flight requests.");
            }
            shutdown.cancel();
        })
        .await?;

    Ok(())
}
