// Registro de push tokens por dispositivo

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    config::AppState,
    domain::push::{PushToken, RegisterTokenRequest},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
};

/// Registra o token de push do dispositivo do usuário. Idempotente: se o
/// token já estiver registrado para este usuário, nada é inserido.
#[utoipa::path(
    post,
    path = "/api/push-tokens",
    tag = "PushTokens",
    security(("bearer_auth" = [])),
    request_body = RegisterTokenRequest,
    responses(
        (status = 201, description = "Token registrado", body = PushToken),
        (status = 200, description = "Token já estava registrado"),
        (status = 422, description = "Token inválido")
    )
)]
pub async fn register_token(
    State(state): State<AppState>,
    AuthUser { user_id, .. }: AuthUser,
    Json(body): Json<RegisterTokenRequest>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    if body.token.trim().is_empty() {
        return Err(AppError::validation("Token de push não pode ser vazio"));
    }

    if !matches!(body.platform.as_str(), "android" | "ios") {
        return Err(AppError::validation("Plataforma precisa ser android ou ios"));
    }

    // Check antes de inserir: registro idempotente
    let already_registered: bool = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM push_tokens WHERE user_id = $1 AND token = $2)",
    )
    .bind(user_id)
    .bind(&body.token)
    .fetch_one(&state.db)
    .await?;

    if already_registered {
        tracing::debug!("Token já registrado para user {}", user_id);
        return Ok((
            StatusCode::OK,
            Json(serde_json::json!({ "message": "Token já estava registrado" })),
        ));
    }

    let token = sqlx::query_as::<_, PushToken>(
        "INSERT INTO push_tokens (user_id, token, platform) VALUES ($1, $2, $3) \
         RETURNING id, user_id, token, platform, created_at",
    )
    .bind(user_id)
    .bind(&body.token)
    .bind(&body.platform)
    .fetch_one(&state.db)
    .await?;

    tracing::info!("Push token registrado - user {} ({})", user_id, token.platform);

    Ok((
        StatusCode::CREATED,
        Json(serde_json::to_value(&token).unwrap_or_default()),
    ))
}

/// Request para remover um token no logout
#[derive(Debug, Deserialize, ToSchema)]
pub struct UnregisterTokenRequest {
    pub token: String,
}

/// Remove o token do dispositivo (chamado no logout)
#[utoipa::path(
    delete,
    path = "/api/push-tokens",
    tag = "PushTokens",
    security(("bearer_auth" = [])),
    request_body = UnregisterTokenRequest,
    responses(
        (status = 200, description = "Token removido"),
        (status = 404, description = "Token não encontrado")
    )
)]
pub async fn unregister_token(
    State(state): State<AppState>,
    AuthUser { user_id, .. }: AuthUser,
    Json(body): Json<UnregisterTokenRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM push_tokens WHERE user_id = $1 AND token = $2")
        .bind(user_id)
        .bind(&body.token)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Token não encontrado"));
    }

    Ok(Json(serde_json::json!({ "message": "Token removido" })))
}
