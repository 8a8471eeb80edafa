// Redis-based Rate Limiting Middleware do Chat Service

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use redis::{AsyncCommands, Client};
use std::env;
use thiserror::Error;

/// Configuração de rate limit vinda do environment
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub guest_requests_per_hour: u32,
    pub guardian_requests_per_hour: u32,
    pub teacher_requests_per_hour: u32,
    pub sensitive_requests_per_hour: u32,
    pub window_seconds: u64,
}

impl RateLimitConfig {
    pub fn from_env() -> Self {
        Self {
            guest_requests_per_hour: env::var("RATE_LIMIT_GUEST_REQUESTS")
                .unwrap_or_else(|_| "100".to_string())
                .parse()
                .unwrap_or(100),
            guardian_requests_per_hour: env::var("RATE_LIMIT_GUARDIAN_REQUESTS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .unwrap_or(300),
            teacher_requests_per_hour: env::var("RATE_LIMIT_TEACHER_REQUESTS")
                .unwrap_or_else(|_| "500".to_string())
                .parse()
                .unwrap_or(500),
            sensitive_requests_per_hour: env::var("RATE_LIMIT_SENSITIVE_ENDPOINTS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap_or(60),
            window_seconds: 3600,
        }
    }
}

/// Rate limiter usando Redis (sliding window por sorted set)
#[derive(Clone)]
pub struct RateLimiter {
    redis_client: Client,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(redis_url: &str) -> Result<Self, RateLimitError> {
        let redis_client = Client::open(redis_url.to_string())
            .map_err(RateLimitError::RedisConnection)?;

        Ok(Self {
            redis_client,
            config: RateLimitConfig::from_env(),
        })
    }

    /// Checa o rate limit para identifier + role
    pub async fn check_rate_limit(
        &self,
        identifier: &str,
        role: &str,
        endpoint: &str,
    ) -> Result<RateLimitResult, RateLimitError> {
        let mut conn = self
            .redis_client
            .get_multiplexed_async_connection()
            .await
            .map_err(RateLimitError::RedisConnection)?;

        let window_key = format!("rate_limit:{}:{}:{}", identifier, role, endpoint);
        let current_time = chrono::Utc::now().timestamp() as u64;
        let window_start = current_time - self.config.window_seconds + 1;

        // Remove entradas antigas e adiciona a atual
        let _: () = conn
            .zrembyscore(&window_key, "-inf", &(window_start - 1))
            .await
            .map_err(RateLimitError::RedisOperation)?;

        let current_count: usize = conn
            .zcard(&window_key)
            .await
            .map_err(RateLimitError::RedisOperation)?;

        let max_requests = self.get_max_requests(role, endpoint);

        let _: () = conn
            .zadd(&window_key, current_time, current_time)
            .await
            .map_err(RateLimitError::RedisOperation)?;

        // Expiration para cleanup
        let _: () = conn
            .expire(&window_key, self.config.window_seconds as i64)
            .await
            .map_err(RateLimitError::RedisOperation)?;

        let is_allowed = current_count < max_requests as usize;
        let remaining = if is_allowed {
            max_requests.saturating_sub(current_count as u32 + 1)
        } else {
            0
        };

        Ok(RateLimitResult {
            allowed: is_allowed,
            current_count: current_count as u32 + 1,
            max_requests,
            remaining,
            reset_time: window_start + self.config.window_seconds,
        })
    }

    fn get_max_requests(&self, role: &str, endpoint: &str) -> u32 {
        // Envio de mensagens é endpoint sensível
        let is_sensitive = endpoint.contains("/messages");

        if is_sensitive {
            self.config.sensitive_requests_per_hour
        } else {
            match role {
                "guest" => self.config.guest_requests_per_hour,
                "guardian" => self.config.guardian_requests_per_hour,
                "teacher" | "admin" => self.config.teacher_requests_per_hour,
                _ => self.config.guest_requests_per_hour,
            }
        }
    }
}

/// Rate limit result
#[derive(Debug, Clone)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub current_count: u32,
    pub max_requests: u32,
    pub remaining: u32,
    pub reset_time: u64,
}

/// Rate limiting error types
#[derive(Error, Debug)]
pub enum RateLimitError {
    #[error("Redis connection error: {0}")]
    RedisConnection(#[from] redis::RedisError),

    #[error("Redis operation error: {0}")]
    RedisOperation(redis::RedisError),
}

/// Axum middleware para rate limiting
pub async fn rate_limit_middleware(
    State(state): State<crate::config::AppState>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    // Extract client identifier (user ID ou IP)
    let identifier = extract_identifier(&request);

    // Extract role do JWT claims, se já autenticado
    let role = request
        .extensions()
        .get::<crate::middleware::auth::AuthUser>()
        .map(|auth| auth.role.clone())
        .unwrap_or_else(|| "guest".to_string());

    let endpoint = request.uri().path().to_string();

    match state
        .rate_limiter
        .check_rate_limit(&identifier, &role, &endpoint)
        .await
    {
        Ok(result) if result.allowed => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();

            if let Ok(v) = result.max_requests.to_string().parse() {
                headers.insert("X-RateLimit-Limit", v);
            }
            if let Ok(v) = result.remaining.to_string().parse() {
                headers.insert("X-RateLimit-Remaining", v);
            }
            if let Ok(v) = result.reset_time.to_string().parse() {
                headers.insert("X-RateLimit-Reset", v);
            }

            Ok(response)
        }
        Ok(_) => {
            let error_response = axum::Json(serde_json::json!({
                "error": "rate_limit_exceeded",
                "message": "Muitas requisições. Tente novamente em alguns minutos."
            }));

            Ok((StatusCode::TOO_MANY_REQUESTS, error_response).into_response())
        }
        Err(e) => {
            // Redis fora do ar não derruba o serviço
            tracing::error!("Rate limiting error: {}", e);
            Ok(next.run(request).await)
        }
    }
}

/// Extract client identifier para rate limiting
fn extract_identifier(request: &Request) -> String {
    if let Some(auth_user) = request.extensions().get::<crate::middleware::auth::AuthUser>() {
        format!("user:{}", auth_user.user_id)
    } else {
        request
            .headers()
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .map(|ip| format!("ip:{}", ip.split(',').next().unwrap_or(ip).trim()))
            .unwrap_or_else(|| "ip:unknown".to_string())
    }
}
