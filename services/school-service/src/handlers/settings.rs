// Handlers das configurações da escola (linha singleton)

use axum::{extract::State, Json};

use crate::{
    config::AppState,
    domain::{SchoolSettings, UpdateSettingsRequest},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
};

const SETTINGS_COLUMNS: &str =
    "id, school_name, pickup_opens_at, pickup_closes_at, canteen_billing_day, updated_at";

/// Configurações atuais da escola, visíveis para qualquer usuário autenticado
#[utoipa::path(
    get,
    path = "/api/settings",
    tag = "Settings",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Configurações da escola", body = SchoolSettings),
        (status = 404, description = "Configurações ainda não cadastradas")
    )
)]
pub async fn get_settings(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> AppResult<Json<SchoolSettings>> {
    let settings = sqlx::query_as::<_, SchoolSettings>(&format!(
        "SELECT {} FROM school_settings ORDER BY id ASC LIMIT 1",
        SETTINGS_COLUMNS
    ))
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::not_found("Configurações ainda não cadastradas"))?;

    Ok(Json(settings))
}

/// Atualiza as configurações (admin). Campos omitidos são preservados.
#[utoipa::path(
    put,
    path = "/api/settings",
    tag = "Settings",
    security(("bearer_auth" = [])),
    request_body = UpdateSettingsRequest,
    responses(
        (status = 200, description = "Configurações atualizadas", body = SchoolSettings),
        (status = 403, description = "Apenas admins"),
        (status = 422, description = "Dados inválidos")
    )
)]
pub async fn update_settings(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<UpdateSettingsRequest>,
) -> AppResult<Json<SchoolSettings>> {
    if !auth.is_admin() {
        return Err(AppError::forbidden(
            "Apenas admins alteram as configurações",
        ));
    }

    let current = sqlx::query_as::<_, SchoolSettings>(&format!(
        "SELECT {} FROM school_settings ORDER BY id ASC LIMIT 1",
        SETTINGS_COLUMNS
    ))
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::not_found("Configurações ainda não cadastradas"))?;

    body.validate(&current).map_err(AppError::validation)?;

    let updated = sqlx::query_as::<_, SchoolSettings>(&format!(
        "UPDATE school_settings SET \
             school_name = COALESCE($2, school_name), \
             pickup_opens_at = COALESCE($3, pickup_opens_at), \
             pickup_closes_at = COALESCE($4, pickup_closes_at), \
             canteen_billing_day = COALESCE($5, canteen_billing_day), \
             updated_at = NOW() \
         WHERE id = $1 \
         RETURNING {}",
        SETTINGS_COLUMNS
    ))
    .bind(current.id)
    .bind(body.school_name.as_deref().map(str::trim))
    .bind(body.pickup_opens_at)
    .bind(body.pickup_closes_at)
    .bind(body.canteen_billing_day)
    .fetch_one(&state.db)
    .await?;

    tracing::info!("Configurações da escola atualizadas pelo admin {}", auth.user_id);

    Ok(Json(updated))
}
