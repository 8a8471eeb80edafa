// Handlers do próprio perfil

use axum::{extract::State, Json};

use crate::{
    config::AppState,
    domain::{Profile, UpdateProfileRequest},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
};

const PROFILE_COLUMNS: &str = "id, name, role, phone, avatar_url, created_at, updated_at";

/// Retorna o perfil do usuário autenticado
#[utoipa::path(
    get,
    path = "/api/me",
    tag = "Profile",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Perfil do usuário", body = Profile),
        (status = 404, description = "Perfil não encontrado")
    )
)]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser { user_id, .. }: AuthUser,
) -> AppResult<Json<Profile>> {
    let profile = sqlx::query_as::<_, Profile>(&format!(
        "SELECT {} FROM profiles WHERE id = $1",
        PROFILE_COLUMNS
    ))
    .bind(user_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::not_found("Perfil não encontrado"))?;

    Ok(Json(profile))
}

/// Atualiza o próprio perfil. Campos omitidos são preservados.
#[utoipa::path(
    put,
    path = "/api/me",
    tag = "Profile",
    security(("bearer_auth" = [])),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Perfil atualizado", body = Profile),
        (status = 422, description = "Dados inválidos")
    )
)]
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser { user_id, .. }: AuthUser,
    Json(body): Json<UpdateProfileRequest>,
) -> AppResult<Json<Profile>> {
    body.validate().map_err(AppError::validation)?;

    let profile = sqlx::query_as::<_, Profile>(&format!(
        "UPDATE profiles SET \
             name = COALESCE($2, name), \
             phone = COALESCE($3, phone), \
             avatar_url = COALESCE($4, avatar_url), \
             updated_at = NOW() \
         WHERE id = $1 \
         RETURNING {}",
        PROFILE_COLUMNS
    ))
    .bind(user_id)
    .bind(body.name.as_deref().map(str::trim))
    .bind(body.phone.as_deref().map(str::trim))
    .bind(body.avatar_url.as_deref())
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::not_found("Perfil não encontrado"))?;

    tracing::info!("Perfil atualizado - user {}", user_id);

    Ok(Json(profile))
}
