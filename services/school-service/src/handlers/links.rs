// Handlers das solicitações de vínculo responsável-aluno
//
// A aprovação é single-shot: o UPDATE condiciona em status = 'pending' e uma
// segunda decisão recebe 409. A criação do vínculo em guardian_students
// acontece na mesma transação da aprovação.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    config::AppState,
    domain::{
        CreateLinkRequest, LinkRequest, LinkRequestListResponse, LinkStatus, RespondLinkRequest,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
};

const LINK_COLUMNS: &str =
    "id, guardian_id, student_id, relationship, status, response_notes, created_at, responded_at";

/// Responsável pede vínculo com um aluno
#[utoipa::path(
    post,
    path = "/api/link-requests",
    tag = "LinkRequests",
    security(("bearer_auth" = [])),
    request_body = CreateLinkRequest,
    responses(
        (status = 201, description = "Solicitação criada", body = LinkRequest),
        (status = 403, description = "Apenas responsáveis"),
        (status = 409, description = "Vínculo ou solicitação pendente já existe"),
        (status = 422, description = "Dados inválidos")
    )
)]
pub async fn create_link_request(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateLinkRequest>,
) -> AppResult<(StatusCode, Json<LinkRequest>)> {
    if !auth.is_guardian() {
        return Err(AppError::forbidden(
            "Apenas responsáveis podem solicitar vínculo",
        ));
    }

    body.validate().map_err(AppError::validation)?;

    let student_exists: bool =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM students WHERE id = $1)")
            .bind(body.student_id)
            .fetch_one(&state.db)
            .await?;
    if !student_exists {
        return Err(AppError::not_found("Aluno não encontrado"));
    }

    let already_linked: bool = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM guardian_students WHERE guardian_id = $1 AND student_id = $2)",
    )
    .bind(auth.user_id)
    .bind(body.student_id)
    .fetch_one(&state.db)
    .await?;
    if already_linked {
        return Err(AppError::conflict("Você já está vinculado a este aluno"));
    }

    let pending_exists: bool = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM link_requests \
         WHERE guardian_id = $1 AND student_id = $2 AND status = 'pending')",
    )
    .bind(auth.user_id)
    .bind(body.student_id)
    .fetch_one(&state.db)
    .await?;
    if pending_exists {
        return Err(AppError::conflict(
            "Já existe uma solicitação pendente para este aluno",
        ));
    }

    let request = sqlx::query_as::<_, LinkRequest>(&format!(
        "INSERT INTO link_requests (guardian_id, student_id, relationship, status) \
         VALUES ($1, $2, $3, 'pending') \
         RETURNING {}",
        LINK_COLUMNS
    ))
    .bind(auth.user_id)
    .bind(body.student_id)
    .bind(body.relationship.trim())
    .fetch_one(&state.db)
    .await?;

    tracing::info!(
        "Solicitação de vínculo criada - guardian {} aluno {}",
        auth.user_id,
        body.student_id
    );

    Ok((StatusCode::CREATED, Json(request)))
}

/// Lista solicitações de vínculo: admin vê as pendentes da escola, o
/// responsável vê as próprias.
#[utoipa::path(
    get,
    path = "/api/link-requests",
    tag = "LinkRequests",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Solicitações visíveis", body = LinkRequestListResponse)
    )
)]
pub async fn list_link_requests(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<LinkRequestListResponse>> {
    let data = if auth.is_admin() {
        sqlx::query_as::<_, LinkRequest>(&format!(
            "SELECT {} FROM link_requests WHERE status = 'pending' ORDER BY created_at ASC",
            LINK_COLUMNS
        ))
        .fetch_all(&state.db)
        .await?
    } else if auth.is_guardian() {
        sqlx::query_as::<_, LinkRequest>(&format!(
            "SELECT {} FROM link_requests WHERE guardian_id = $1 ORDER BY created_at DESC",
            LINK_COLUMNS
        ))
        .bind(auth.user_id)
        .fetch_all(&state.db)
        .await?
    } else {
        return Err(AppError::forbidden(
            "Professores não participam de solicitações de vínculo",
        ));
    };

    let total = data.len() as i64;
    Ok(Json(LinkRequestListResponse { data, total }))
}

/// Admin aprova ou rejeita a solicitação. Decisão única: se a linha já saiu
/// de pending a resposta é 409. Aprovação cria o vínculo na mesma transação.
#[utoipa::path(
    put,
    path = "/api/link-requests/{id}/respond",
    tag = "LinkRequests",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "ID da solicitação")),
    request_body = RespondLinkRequest,
    responses(
        (status = 200, description = "Solicitação respondida", body = LinkRequest),
        (status = 403, description = "Apenas admins"),
        (status = 404, description = "Solicitação não encontrada"),
        (status = 409, description = "Solicitação já respondida")
    )
)]
pub async fn respond_link_request(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(request_id): Path<i32>,
    Json(body): Json<RespondLinkRequest>,
) -> AppResult<Json<LinkRequest>> {
    if !auth.is_admin() {
        return Err(AppError::forbidden(
            "Apenas admins respondem solicitações de vínculo",
        ));
    }

    // Busca antes para diferenciar 404 de 409
    let existing = sqlx::query_as::<_, LinkRequest>(&format!(
        "SELECT {} FROM link_requests WHERE id = $1",
        LINK_COLUMNS
    ))
    .bind(request_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::not_found("Solicitação não encontrada"))?;

    let next_status = if body.approve {
        LinkStatus::Approved
    } else {
        LinkStatus::Rejected
    };

    let mut tx = state.db.begin().await?;

    // Check-and-set: só a primeira decisão vence
    let updated = sqlx::query_as::<_, LinkRequest>(&format!(
        "UPDATE link_requests \
         SET status = $2, response_notes = $3, responded_at = NOW() \
         WHERE id = $1 AND status = 'pending' \
         RETURNING {}",
        LINK_COLUMNS
    ))
    .bind(request_id)
    .bind(next_status.as_str())
    .bind(body.notes.as_deref())
    .fetch_optional(&mut *tx)
    .await?;

    let Some(updated) = updated else {
        tx.rollback().await?;
        tracing::warn!(
            "Solicitação {} já estava {} - decisão descartada",
            request_id,
            existing.status
        );
        return Err(AppError::conflict("Solicitação já foi respondida"));
    };

    if body.approve {
        sqlx::query(
            "INSERT INTO guardian_students (guardian_id, student_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(updated.guardian_id)
        .bind(updated.student_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    tracing::info!(
        "Solicitação de vínculo {} {} pelo admin {}",
        request_id,
        updated.status,
        auth.user_id
    );

    Ok(Json(updated))
}
