// Main Entry Point do Chat Service
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod domain;
mod error;
mod handlers;
mod middleware;
mod repositories;
mod routes;
mod utils;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chat_service=debug,tower_http=debug,async_nats=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("💬 Starting Universo do Saber - Chat Service");
    tracing::info!("🔧 Mensagens em tempo real com WebSocket & NATS");

    tracing::info!("🔌 Initializing application state...");
    let config = config::AppConfig::from_env()
        .map_err(|e| format!("Failed to load configuration: {}", e))?;
    let state = config::AppState::new(config)
        .await
        .map_err(|e| format!("Failed to initialize app state: {}", e))?;
    tracing::info!("✅ Application state initialized");

    // Health checks das dependências
    tracing::info!("🔍 Performing health checks...");
    let health = state.health_check().await;

    if health.database == "healthy" {
        tracing::info!("✅ Database connection healthy");
    } else {
        tracing::error!("❌ Database connection failed");
        return Err("Database health check failed".into());
    }

    match health.nats.as_str() {
        "healthy" => tracing::info!("✅ NATS connection healthy"),
        "disabled" => tracing::warn!("⚠️ NATS não inicializado - chat sem tempo real"),
        _ => tracing::warn!("⚠️ NATS connection not ready - tempo real pode ficar limitado"),
    }

    tracing::info!("🌍 Environment: {}", state.config.environment);
    if state.config.is_production() {
        tracing::warn!("🚨 Running in PRODUCTION mode - all security features enabled");
    } else {
        tracing::info!("🧪 Running in DEVELOPMENT mode - relaxed validation");
    }

    // Build application com todas as layers
    let app = routes::create_router(state.clone());

    let addr = format!("{}:{}", state.config.server_host, state.config.server_port);

    tracing::info!("🎯 Chat Service listening on {}", addr);
    tracing::info!("📚 API Documentation:");
    tracing::info!("   - Swagger UI: http://{}/swagger-ui", addr);
    tracing::info!("   - ReDoc: http://{}/redoc", addr);
    tracing::info!("   - Health Check: http://{}/health", addr);
    tracing::info!("🔌 WebSocket Endpoint: ws://{}/api/ws/chat/:conversation_id", addr);

    tracing::info!("🚀 Chat Service Features:");
    tracing::info!("   ✅ Conversas por trio (professor, responsável, aluno)");
    tracing::info!("   ✅ Mensagens em tempo real (WebSocket)");
    tracing::info!("   ✅ Read receipts & typing indicators");
    tracing::info!("   ✅ Notificação push via notification-service");
    tracing::info!("   ✅ JWT-Only authentication");
    tracing::info!("   ✅ Redis-based rate limiting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
