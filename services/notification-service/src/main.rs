// Notification Service - Universo do Saber

mod config;
mod domain;
mod error;
mod handlers;
mod middleware;
mod realtime;
mod routes;
mod utils;

use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing para logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "notification_service=debug,tower_http=debug,async_nats=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("🚀 Starting Universo do Saber - Notification Service");

    // Initialize AppState com database, Redis, NATS e push gateway
    tracing::info!("🔌 Initializing application state...");
    let state = config::AppState::new()
        .await
        .map_err(|e| format!("Failed to initialize app state: {}", e))?;
    tracing::info!("✅ Application state initialized");

    // Environment check & security warning
    if state.config.is_production() {
        tracing::warn!("⚙️  Running in PRODUCTION mode");
    } else {
        tracing::info!("⚙️  Running in DEVELOPMENT mode");
    }

    // Health check das dependências
    let health = state.health_check().await;
    if health.overall == "healthy" {
        tracing::info!("✅ Database health check passed");
    } else {
        tracing::warn!("⚠️ Health check: Database {}", health.database);
    }
    tracing::info!("📡 Realtime feed (NATS): {}", health.nats);

    // Create router com security layers
    let app = routes::create_router(state.clone()).layer(TraceLayer::new_for_http());

    // Server address
    let addr = format!("{}:{}", state.config.server_host, state.config.server_port);
    tracing::info!("🎯 Notification Service listening on {}", addr);
    tracing::info!("📚 API Documentation:");
    tracing::info!("   - Health Check: http://{}/health", addr);
    tracing::info!("   - Swagger UI: http://{}/swagger-ui", addr);
    tracing::info!("   - ReDoc: http://{}/redoc", addr);
    tracing::info!("   - OpenAPI JSON: http://{}/api-docs/openapi.json", addr);
    tracing::info!("🔌 WebSocket Feed: ws://{}/api/ws/feed?token=...", addr);
    tracing::info!("🌍 Environment: {}", state.config.environment);

    tracing::info!("✅ Todas as features do notification-service prontas:");
    tracing::info!("   1. ✅ Fluxo de retirada (criar, responder com check-and-set, ler, limpar)");
    tracing::info!("   2. ✅ Notificações push genéricas (GET, PUT read, PUT read-all, unread-count)");
    tracing::info!("   3. ✅ Registro idempotente de push tokens");
    tracing::info!("   4. ✅ Feed de mudanças em tempo real (NATS + WebSocket)");
    tracing::info!("   5. ✅ Badge combinado numa única consulta");
    tracing::info!("   6. ✅ Rate limiting com Redis, CORS & security headers");

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
