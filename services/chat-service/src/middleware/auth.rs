// JWT-Only Authentication Middleware do Chat Service

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::{config::AppState, error::AppError};

/// Usuário já autenticado
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i32,
    pub role: String,
}

/// Implement Axum extractor para AuthUser
impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts<'life0, 'life1>(
        parts: &'life0 mut axum::http::request::Parts,
        _state: &'life1 S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| AppError::unauthorized("Authentication required"))
    }
}

/// Extrai o JWT token do Authorization header
fn extract_jwt_token(headers: &HeaderMap) -> Result<String, AppError> {
    let auth_header = headers
        .get("authorization")
        .ok_or_else(|| AppError::unauthorized("Authorization header missing"))?
        .to_str()
        .map_err(|_| AppError::unauthorized("Invalid authorization header"))?;

    shared::utils::jwt::extract_bearer_token(auth_header)
        .ok_or_else(|| AppError::unauthorized("Invalid authorization header format"))
}

/// Authentication middleware validando access tokens
pub async fn auth_middleware(
    State(_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Extract JWT token
    let token = extract_jwt_token(request.headers())?;

    // Validação de assinatura + tipo de token
    let claims = shared::utils::jwt::validate_access_token(&token)
        .map_err(|_| AppError::unauthorized("Invalid or expired JWT token"))?;

    // Injeta os dados do usuário nas request extensions
    request.extensions_mut().insert(AuthUser {
        user_id: claims.sub,
        role: claims.role.clone(),
    });

    // Log para audit trail
    tracing::debug!(
        "User authenticated - id: {}, email: {}, role: {}",
        claims.sub,
        claims.email,
        claims.role
    );

    Ok(next.run(request).await)
}
