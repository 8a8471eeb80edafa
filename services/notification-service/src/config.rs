use sqlx::{postgres::PgPoolOptions, PgPool};
use std::env;
use std::sync::Arc;
use std::time::Duration;

use crate::middleware::rate_limit::RateLimiter;
use crate::utils::expo::{ExpoPushClient, PushSender};

/// Configuração principal da aplicação carregada das environment variables
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_host: String,
    pub server_port: u16,
    pub environment: String,
    pub nats_url: String,
    pub redis_url: String,
    pub expo_push_url: String,
    pub service_token: String,
    pub frontend_url: String,
}

impl AppConfig {
    /// Carrega toda a configuração do env file com validação
    pub fn from_env() -> Result<Self, String> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| "DATABASE_URL precisa estar definida no environment")?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| "JWT_SECRET precisa estar definida no environment")?;

        // Validação: JWT secret não pode usar valor default em produção
        if !cfg!(debug_assertions) && jwt_secret.contains("change-this") {
            return Err("JWT_SECRET ainda está com o valor default! Troque por um valor seguro para produção".to_string());
        }

        let server_host = env::var("NOTIFICATION_SERVICE_HOST")
            .unwrap_or_else(|_| "0.0.0.0".to_string());

        let server_port = env::var("NOTIFICATION_SERVICE_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3002);

        let environment = env::var("RUST_ENV").unwrap_or_else(|_| "development".to_string());

        let nats_url = env::var("NATS_URL")
            .unwrap_or_else(|_| "nats://localhost:4222".to_string());

        let redis_url = env::var("REDIS_URL")
            .map_err(|_| "REDIS_URL precisa estar definida para rate limiting")?;

        let expo_push_url = env::var("EXPO_PUSH_URL")
            .unwrap_or_else(|_| "https://exp.host/--/api/v2/push/send".to_string());

        let service_token = env::var("SERVICE_TOKEN")
            .map_err(|_| "SERVICE_TOKEN precisa estar definida para chamadas entre serviços")?;

        let frontend_url = env::var("FRONTEND_URL")
            .map_err(|_| "FRONTEND_URL precisa estar definida no environment")?;

        Ok(AppConfig {
            database_url,
            jwt_secret,
            server_host,
            server_port,
            environment,
            nats_url,
            redis_url,
            expo_push_url,
            service_token,
            frontend_url,
        })
    }

    /// Helper para checar se está rodando em produção
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Inicialização do connection pool do banco
pub async fn init_db_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    tracing::info!("🔌 Initializing Notification Service database connection...");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(20))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .test_before_acquire(true)
        .connect(database_url)
        .await?;

    tracing::info!("✅ Notification Service database pool initialized successfully");
    Ok(pool)
}

/// Health check da conexão com o banco
pub async fn check_db_health(pool: &PgPool) -> bool {
    sqlx::query("SELECT 1")
        .fetch_one(pool)
        .await
        .is_ok()
}

/// State da aplicação compartilhado com todos os handlers
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: AppConfig,
    pub rate_limiter: RateLimiter,
    pub nats_client: Option<async_nats::Client>,
    pub push_sender: Arc<dyn PushSender>,
}

/// Implement FromRef para extrair PgPool do AppState
impl axum::extract::FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

/// Implement FromRef para extrair AppConfig do AppState
impl axum::extract::FromRef<AppState> for AppConfig {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

/// Implement FromRef para extrair RateLimiter do AppState
impl axum::extract::FromRef<AppState> for RateLimiter {
    fn from_ref(state: &AppState) -> Self {
        state.rate_limiter.clone()
    }
}

impl AppState {
    /// Cria AppState novo com todas as dependências
    pub async fn new() -> Result<Self, String> {
        let config = AppConfig::from_env()?;
        let db = init_db_pool(&config.database_url)
            .await
            .map_err(|e| format!("Falha ao inicializar o banco: {}", e))?;

        tracing::info!("🔄 Initializing Redis rate limiter...");
        let rate_limiter = RateLimiter::new(&config.redis_url)
            .map_err(|e| format!("Falha ao inicializar o rate limiter Redis: {}", e))?;
        tracing::info!("✅ Redis rate limiter initialized successfully");

        // NATS é best-effort: sem NATS o serviço continua aceitando writes,
        // só o feed em tempo real fica indisponível
        let nats_client = match async_nats::connect(&config.nats_url).await {
            Ok(client) => {
                tracing::info!("✅ NATS connection established at {}", config.nats_url);
                Some(client)
            }
            Err(e) => {
                tracing::warn!("⚠️ NATS indisponível ({}), feed em tempo real desativado", e);
                None
            }
        };

        // HTTP client para o gateway de push da Expo
        let push_sender: Arc<dyn PushSender> = Arc::new(
            ExpoPushClient::new(&config.expo_push_url)
                .map_err(|e| format!("Falha ao inicializar o cliente de push: {}", e))?,
        );

        Ok(AppState {
            db,
            config,
            rate_limiter,
            nats_client,
            push_sender,
        })
    }

    /// Health check das dependências
    pub async fn health_check(&self) -> HealthStatus {
        let db_healthy = check_db_health(&self.db).await;

        let nats = match &self.nats_client {
            Some(client) => match client.connection_state() {
                async_nats::connection::State::Connected => "healthy",
                _ => "degraded",
            },
            None => "disabled",
        };

        HealthStatus {
            database: if db_healthy { "healthy" } else { "unhealthy" }.to_string(),
            nats: nats.to_string(),
            overall: if db_healthy { "healthy" } else { "degraded" }.to_string(),
        }
    }
}

/// Estrutura de response do endpoint de health check
#[derive(Debug, serde::Serialize)]
pub struct HealthStatus {
    pub database: String,
    pub nats: String,
    pub overall: String,
}
