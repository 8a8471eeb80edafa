use sqlx::{postgres::PgPoolOptions, PgPool};
use std::env;
use std::time::Duration;

// Konfiguração principal carregada das environment variables
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub environment: String,
    pub frontend_url: String,
}

impl AppConfig {
    // Load de toda a configuração do env file com validação
    pub fn from_env() -> Result<Self, String> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| "DATABASE_URL deve estar definida")?;

        // JWT_SECRET precisa existir para o auth middleware
        let jwt_secret = env::var("JWT_SECRET").map_err(|_| "JWT_SECRET deve estar definida")?;

        if !cfg!(debug_assertions) && jwt_secret.contains("change-this") {
            return Err(
                "JWT_SECRET ainda está com o valor default! Troque por um valor seguro em produção"
                    .to_string(),
            );
        }

        let server_host =
            env::var("SCHOOL_SERVICE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let server_port = env::var("SCHOOL_SERVICE_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3004);

        let environment = env::var("RUST_ENV").unwrap_or_else(|_| "development".to_string());

        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:8081".to_string());

        Ok(AppConfig {
            database_url,
            server_host,
            server_port,
            environment,
            frontend_url,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

// Estado compartilhado entre os handlers
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: AppConfig,
}

impl AppState {
    pub async fn new(config: AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let db = init_db_pool(&config.database_url).await?;
        Ok(AppState { db, config })
    }

    pub async fn health_check(&self) -> HealthStatus {
        let database = match sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.db)
            .await
        {
            Ok(_) => "healthy",
            Err(_) => "unhealthy",
        };

        HealthStatus {
            database: database.to_string(),
            overall: if database == "healthy" {
                "healthy".to_string()
            } else {
                "unhealthy".to_string()
            },
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct HealthStatus {
    pub database: String,
    pub overall: String,
}

// Pool de conexões com os mesmos timeouts dos outros serviços
pub async fn init_db_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(300))
        .max_lifetime(Duration::from_secs(1800))
        .connect(database_url)
        .await
}
