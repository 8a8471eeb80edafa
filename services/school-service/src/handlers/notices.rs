// Handlers do mural de avisos

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    config::AppState,
    domain::{CreateNoticeRequest, Notice, NoticeAudience, NoticeListResponse},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
};

const NOTICE_COLUMNS: &str = "n.id, n.title, n.body, n.audience, n.author_id, \
                              p.name AS author_name, n.created_at";

/// Publica um aviso no mural (professor ou admin)
#[utoipa::path(
    post,
    path = "/api/notices",
    tag = "Notices",
    security(("bearer_auth" = [])),
    request_body = CreateNoticeRequest,
    responses(
        (status = 201, description = "Aviso publicado", body = Notice),
        (status = 403, description = "Apenas professores e admins"),
        (status = 422, description = "Dados inválidos")
    )
)]
pub async fn create_notice(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateNoticeRequest>,
) -> AppResult<(StatusCode, Json<Notice>)> {
    if !auth.is_teacher() && !auth.is_admin() {
        return Err(AppError::forbidden(
            "Apenas professores e admins publicam avisos",
        ));
    }

    body.validate().map_err(AppError::validation)?;

    let title = shared::utils::validation::sanitize_html(body.title.trim());
    let content = shared::utils::validation::sanitize_html(body.body.trim());

    let notice = sqlx::query_as::<_, Notice>(&format!(
        "WITH inserted AS ( \
             INSERT INTO notices (title, body, audience, author_id) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, title, body, audience, author_id, created_at \
         ) \
         SELECT {} FROM inserted n LEFT JOIN profiles p ON p.id = n.author_id",
        NOTICE_COLUMNS
    ))
    .bind(&title)
    .bind(&content)
    .bind(&body.audience)
    .bind(auth.user_id)
    .fetch_one(&state.db)
    .await?;

    tracing::info!(
        "Aviso publicado - id {} por user {} para {}",
        notice.id,
        auth.user_id,
        notice.audience
    );

    Ok((StatusCode::CREATED, Json(notice)))
}

/// Lista os avisos visíveis para o papel do usuário, mais recentes primeiro
#[utoipa::path(
    get,
    path = "/api/notices",
    tag = "Notices",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Avisos visíveis", body = NoticeListResponse)
    )
)]
pub async fn list_notices(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<NoticeListResponse>> {
    // Admin vê tudo; os demais veem 'all' + o público do próprio papel
    let data = if auth.is_admin() {
        sqlx::query_as::<_, Notice>(&format!(
            "SELECT {} FROM notices n LEFT JOIN profiles p ON p.id = n.author_id \
             ORDER BY n.created_at DESC",
            NOTICE_COLUMNS
        ))
        .fetch_all(&state.db)
        .await?
    } else {
        let audience = if auth.is_guardian() {
            NoticeAudience::Guardians
        } else {
            NoticeAudience::Teachers
        };
        sqlx::query_as::<_, Notice>(&format!(
            "SELECT {} FROM notices n LEFT JOIN profiles p ON p.id = n.author_id \
             WHERE n.audience IN ('all', $1) \
             ORDER BY n.created_at DESC",
            NOTICE_COLUMNS
        ))
        .bind(audience.as_str())
        .fetch_all(&state.db)
        .await?
    };

    let total = data.len() as i64;
    Ok(Json(NoticeListResponse { data, total }))
}

/// Remove um aviso. Só o autor ou um admin.
#[utoipa::path(
    delete,
    path = "/api/notices/{id}",
    tag = "Notices",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "ID do aviso")),
    responses(
        (status = 204, description = "Aviso removido"),
        (status = 403, description = "Aviso de outro autor"),
        (status = 404, description = "Aviso não encontrado")
    )
)]
pub async fn delete_notice(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(notice_id): Path<i32>,
) -> AppResult<StatusCode> {
    let author_id: i32 =
        sqlx::query_scalar::<_, i32>("SELECT author_id FROM notices WHERE id = $1")
            .bind(notice_id)
            .fetch_optional(&state.db)
            .await?
            .ok_or_else(|| AppError::not_found("Aviso não encontrado"))?;

    if author_id != auth.user_id && !auth.is_admin() {
        return Err(AppError::forbidden("Só o autor ou um admin remove o aviso"));
    }

    sqlx::query("DELETE FROM notices WHERE id = $1")
        .bind(notice_id)
        .execute(&state.db)
        .await?;

    tracing::info!("Aviso {} removido por user {}", notice_id, auth.user_id);

    Ok(StatusCode::NO_CONTENT)
}
