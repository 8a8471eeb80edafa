// Main Entry Point do Canteen Service
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod domain;
mod error;
mod handlers;
mod middleware;
mod routes;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "canteen_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("🍎 Starting Universo do Saber - Canteen Service");
    tracing::info!("🔧 Cardápio, consumo e faturas mensais");

    tracing::info!("🔌 Initializing application state...");
    let config = config::AppConfig::from_env()
        .map_err(|e| format!("Failed to load configuration: {}", e))?;
    let state = config::AppState::new(config)
        .await
        .map_err(|e| format!("Failed to initialize app state: {}", e))?;
    tracing::info!("✅ Application state initialized");

    // Health check do banco
    let health = state.health_check().await;
    if health.database == "healthy" {
        tracing::info!("✅ Database connection healthy");
    } else {
        tracing::error!("❌ Database connection failed");
        return Err("Database health check failed".into());
    }

    tracing::info!("🌍 Environment: {}", state.config.environment);
    if state.config.is_production() {
        tracing::warn!("🚨 Running in PRODUCTION mode - all security features enabled");
    } else {
        tracing::info!("🧪 Running in DEVELOPMENT mode - relaxed validation");
    }

    let app = routes::create_router(state.clone());

    let addr = format!("{}:{}", state.config.server_host, state.config.server_port);

    tracing::info!("🎯 Canteen Service listening on {}", addr);
    tracing::info!("📚 API Documentation:");
    tracing::info!("   - Swagger UI: http://{}/swagger-ui", addr);
    tracing::info!("   - ReDoc: http://{}/redoc", addr);
    tracing::info!("   - Health Check: http://{}/health", addr);

    tracing::info!("🚀 Canteen Service Features:");
    tracing::info!("   ✅ Cardápio com preço unitário");
    tracing::info!("   ✅ Consumo + fatura na mesma transação");
    tracing::info!("   ✅ Fatura única por aluno e mês");
    tracing::info!("   ✅ Baixa de pagamento single-shot");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
