// Handlers do fluxo de autorização de retirada - Universo do Saber

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    config::AppState,
    domain::pickup::{
        ClearAllResponse, CreatePickupRequest, MarkReadResponse, PickupListResponse,
        PickupRequest, PickupResponse, ReadAllResponse, RespondPickupRequest, ResponseStamp,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    realtime::{self, ChangeEvent, ChangeType},
    utils::expo,
};

/// Pagination query parameters
#[derive(Debug, Deserialize, ToSchema)]
pub struct PickupQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

const PICKUP_COLUMNS: &str = "id, guardian_id, student_id, teacher_id, requested_at, reason, \
     status, response_notes, read_at, confirmed_at, completed_at, created_at";

/// Lista as solicitações de retirada visíveis para o usuário autenticado.
/// A visibilidade é imposta no servidor: responsável vê as suas, professor
/// vê as endereçadas a ele. Paginado para não carregar a lista inteira.
#[utoipa::path(
    get,
    path = "/api/pickups",
    tag = "Pickups",
    security(("bearer_auth" = [])),
    params(
        ("page" = Option<u32>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u32>, Query, description = "Items per page (default: 20)")
    ),
    responses(
        (status = 200, description = "Solicitações carregadas", body = PickupListResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_pickups(
    State(state): State<AppState>,
    AuthUser { user_id, .. }: AuthUser,
    Query(query): Query<PickupQuery>,
) -> AppResult<Json<PickupListResponse>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * limit;

    let sql = format!(
        "SELECT {} FROM pickup_requests \
         WHERE guardian_id = $1 OR teacher_id = $1 \
         ORDER BY created_at DESC LIMIT $2 OFFSET $3",
        PICKUP_COLUMNS
    );

    let requests = sqlx::query_as::<_, PickupRequest>(&sql)
        .bind(user_id)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&state.db)
        .await
        .map_err(|e| {
            tracing::error!("Falha ao buscar solicitações do user {}: {}", user_id, e);
            AppError::internal("Falha ao carregar solicitações de retirada")
        })?;

    let total: i64 = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM pickup_requests WHERE guardian_id = $1 OR teacher_id = $1",
    )
    .bind(user_id)
    .fetch_one(&state.db)
    .await?;

    // O contador usa o mesmo predicado derivado do is_unread do domínio
    let unread_count: i64 = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM pickup_requests \
         WHERE (guardian_id = $1 OR teacher_id = $1) \
           AND read_at IS NULL AND confirmed_at IS NULL AND completed_at IS NULL",
    )
    .bind(user_id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(PickupListResponse {
        data: requests.into_iter().map(PickupResponse::from).collect(),
        total: total as u32,
        page,
        limit,
        unread_count,
    }))
}

/// Cria uma solicitação de retirada (somente responsável). O professor é
/// derivado da turma do aluno; o vínculo responsável-aluno é validado
/// antes de gravar.
#[utoipa::path(
    post,
    path = "/api/pickups",
    tag = "Pickups",
    security(("bearer_auth" = [])),
    request_body = CreatePickupRequest,
    responses(
        (status = 201, description = "Solicitação criada", body = PickupResponse),
        (status = 403, description = "Apenas responsáveis podem solicitar retirada"),
        (status = 422, description = "Motivo inválido")
    )
)]
pub async fn create_pickup(
    State(state): State<AppState>,
    AuthUser { user_id, role }: AuthUser,
    Json(body): Json<CreatePickupRequest>,
) -> AppResult<(StatusCode, Json<PickupResponse>)> {
    if role != "guardian" {
        return Err(AppError::forbidden(
            "Apenas responsáveis podem solicitar retirada",
        ));
    }

    if !shared::utils::validation::is_valid_reason(&body.reason) {
        return Err(AppError::validation(
            "O motivo da retirada é obrigatório (máximo de 500 caracteres)",
        ));
    }

    // Vínculo responsável-aluno precisa existir e estar aprovado
    let is_linked: bool = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM guardian_students WHERE guardian_id = $1 AND student_id = $2)",
    )
    .bind(user_id)
    .bind(body.student_id)
    .fetch_one(&state.db)
    .await?;

    if !is_linked {
        return Err(AppError::forbidden(
            "Aluno não está vinculado a este responsável",
        ));
    }

    // O destinatário é o professor da turma atual do aluno
    let teacher_id: Option<i32> = sqlx::query_scalar::<_, i32>(
        "SELECT c.teacher_id FROM enrollments e \
         JOIN classes c ON c.id = e.class_id \
         WHERE e.student_id = $1 \
         ORDER BY c.school_year DESC LIMIT 1",
    )
    .bind(body.student_id)
    .fetch_optional(&state.db)
    .await?;

    let teacher_id = teacher_id
        .ok_or_else(|| AppError::not_found("Aluno não está matriculado em nenhuma turma"))?;

    let reason = shared::utils::validation::sanitize_html(body.reason.trim());

    let sql = format!(
        "INSERT INTO pickup_requests (guardian_id, student_id, teacher_id, requested_at, reason, status) \
         VALUES ($1, $2, $3, $4, $5, 'pending') \
         RETURNING {}",
        PICKUP_COLUMNS
    );

    let request = sqlx::query_as::<_, PickupRequest>(&sql)
        .bind(user_id)
        .bind(body.student_id)
        .bind(teacher_id)
        .bind(body.requested_at)
        .bind(&reason)
        .fetch_one(&state.db)
        .await?;

    tracing::info!(
        "Solicitação de retirada {} criada - responsável {} -> professor {}",
        request.id,
        user_id,
        teacher_id
    );

    // Evento para os dois lados: o professor vê a nova pendência, os outros
    // dispositivos do responsável também atualizam
    let event = ChangeEvent::new(
        "pickup_requests",
        ChangeType::Insert,
        serde_json::to_value(&request).ok(),
        None,
    );
    realtime::publish_to_both(&state.nats_client, user_id, teacher_id, event).await;

    expo::send_to_user(
        &state.db,
        state.push_sender.as_ref(),
        teacher_id,
        "Nova solicitação de retirada",
        &format!("Motivo: {}", request.reason),
        serde_json::json!({ "screen": "pickups", "pickup_id": request.id }),
    )
    .await;

    Ok((StatusCode::CREATED, Json(PickupResponse::from(request))))
}

/// Responde uma solicitação (somente o professor destinatário). A transição
/// pending -> confirmed/rejected é single-shot, garantida por check-and-set
/// no banco: duas respostas concorrentes nunca sobrescrevem uma à outra,
/// a segunda recebe 409.
#[utoipa::path(
    put,
    path = "/api/pickups/{id}/respond",
    tag = "Pickups",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Pickup request ID")),
    request_body = RespondPickupRequest,
    responses(
        (status = 200, description = "Resposta registrada", body = PickupResponse),
        (status = 404, description = "Solicitação não encontrada"),
        (status = 409, description = "Solicitação já foi respondida")
    )
)]
pub async fn respond_pickup(
    State(state): State<AppState>,
    AuthUser { user_id, role }: AuthUser,
    Path(id): Path<i32>,
    Json(body): Json<RespondPickupRequest>,
) -> AppResult<Json<PickupResponse>> {
    if role != "teacher" {
        return Err(AppError::forbidden(
            "Apenas professores podem responder solicitações",
        ));
    }

    let select_sql = format!(
        "SELECT {} FROM pickup_requests WHERE id = $1 AND teacher_id = $2",
        PICKUP_COLUMNS
    );

    let previous = sqlx::query_as::<_, PickupRequest>(&select_sql)
        .bind(id)
        .bind(user_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::not_found("Solicitação não encontrada"))?;

    let stamp = ResponseStamp::for_decision(body.approve, Utc::now());
    let notes = body
        .notes
        .as_deref()
        .map(|n| shared::utils::validation::sanitize_html(n.trim()));

    // Check-and-set: só atualiza se ainda estiver pendente
    let update_sql = format!(
        "UPDATE pickup_requests \
         SET status = $1, response_notes = $2, read_at = $3, confirmed_at = $4, completed_at = $5 \
         WHERE id = $6 AND teacher_id = $7 AND status = 'pending' \
         RETURNING {}",
        PICKUP_COLUMNS
    );

    let updated = sqlx::query_as::<_, PickupRequest>(&update_sql)
        .bind(stamp.status.as_str())
        .bind(&notes)
        .bind(stamp.read_at)
        .bind(stamp.confirmed_at)
        .bind(stamp.completed_at)
        .bind(id)
        .bind(user_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| {
            tracing::warn!(
                "Resposta duplicada na solicitação {} (status atual: {})",
                id,
                previous.status
            );
            AppError::conflict("Solicitação já foi respondida por outro dispositivo")
        })?;

    tracing::info!(
        "Solicitação {} respondida pelo professor {} - status: {}",
        id,
        user_id,
        updated.status
    );

    let event = ChangeEvent::new(
        "pickup_requests",
        ChangeType::Update,
        serde_json::to_value(&updated).ok(),
        serde_json::to_value(&previous).ok(),
    );
    realtime::publish_to_both(&state.nats_client, updated.guardian_id, user_id, event).await;

    let (title, fallback_body) = if body.approve {
        ("Retirada confirmada", "O professor confirmou a retirada")
    } else {
        ("Retirada recusada", "O professor recusou a retirada")
    };
    let push_body = notes.as_deref().unwrap_or(fallback_body).to_string();

    expo::send_to_user(
        &state.db,
        state.push_sender.as_ref(),
        updated.guardian_id,
        title,
        &push_body,
        serde_json::json!({ "screen": "pickups", "pickup_id": updated.id }),
    )
    .await;

    Ok(Json(PickupResponse::from(updated)))
}

/// Marca uma solicitação como lida (grava o timestamp genérico). Idempotente:
/// o COALESCE preserva a primeira leitura.
#[utoipa::path(
    put,
    path = "/api/pickups/{id}/read",
    tag = "Pickups",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Pickup request ID")),
    responses(
        (status = 200, description = "Solicitação marcada como lida", body = MarkReadResponse),
        (status = 404, description = "Solicitação não encontrada")
    )
)]
pub async fn mark_as_read(
    State(state): State<AppState>,
    AuthUser { user_id, .. }: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<Json<MarkReadResponse>> {
    let updated: Option<i32> = sqlx::query_scalar::<_, i32>(
        "UPDATE pickup_requests SET read_at = COALESCE(read_at, NOW()) \
         WHERE id = $1 AND (guardian_id = $2 OR teacher_id = $2) \
         RETURNING id",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(&state.db)
    .await?;

    if updated.is_none() {
        return Err(AppError::not_found("Solicitação não encontrada"));
    }

    Ok(Json(MarkReadResponse {
        message: "Solicitação marcada como lida".to_string(),
    }))
}

/// Marca todas as solicitações não lidas como lidas. Idempotente: a segunda
/// chamada afeta 0 linhas e continua retornando 200.
#[utoipa::path(
    put,
    path = "/api/pickups/read-all",
    tag = "Pickups",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Solicitações marcadas como lidas", body = ReadAllResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn mark_all_as_read(
    State(state): State<AppState>,
    AuthUser { user_id, .. }: AuthUser,
) -> AppResult<Json<ReadAllResponse>> {
    let result = sqlx::query(
        "UPDATE pickup_requests SET read_at = NOW() \
         WHERE (guardian_id = $1 OR teacher_id = $1) \
           AND read_at IS NULL AND confirmed_at IS NULL AND completed_at IS NULL",
    )
    .bind(user_id)
    .execute(&state.db)
    .await
    .map_err(|e| {
        tracing::error!("Falha ao marcar todas como lidas para user {}: {}", user_id, e);
        AppError::internal("Falha ao marcar solicitações como lidas")
    })?;

    let affected_count = result.rows_affected() as i64;

    Ok(Json(ReadAllResponse {
        message: format!("{} solicitação(ões) marcada(s) como lida(s)", affected_count),
        affected_count,
    }))
}

/// Limpa todas as solicitações visíveis para o usuário (hard delete).
#[utoipa::path(
    delete,
    path = "/api/pickups",
    tag = "Pickups",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Solicitações removidas", body = ClearAllResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn clear_all(
    State(state): State<AppState>,
    AuthUser { user_id, .. }: AuthUser,
) -> AppResult<Json<ClearAllResponse>> {
    let result = sqlx::query(
        "DELETE FROM pickup_requests WHERE guardian_id = $1 OR teacher_id = $1",
    )
    .bind(user_id)
    .execute(&state.db)
    .await?;

    let deleted_count = result.rows_affected() as i64;

    tracing::info!(
        "User {} limpou {} solicitação(ões) de retirada",
        user_id,
        deleted_count
    );

    // Sinaliza os outros dispositivos do usuário para descartar a lista
    let event = ChangeEvent::new("pickup_requests", ChangeType::Delete, None, None);
    realtime::publish_to_user(&state.nats_client, user_id, event).await;

    Ok(Json(ClearAllResponse {
        message: format!("{} solicitação(ões) removida(s)", deleted_count),
        deleted_count,
    }))
}
