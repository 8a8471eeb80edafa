// Handlers das notificações push genéricas (stream separado das retiradas)

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    config::AppState,
    domain::pickup::{ClearAllResponse, MarkReadResponse, ReadAllResponse},
    domain::push::{
        BadgeResponse, InternalNotifyRequest, PushNotificationListResponse,
        PushNotificationRecord, PushNotificationResponse, UnreadCountResponse,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    realtime::{self, ChangeEvent, ChangeType},
    utils::expo,
};

/// Pagination query parameters
#[derive(Debug, Deserialize, ToSchema)]
pub struct PushQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

const PUSH_COLUMNS: &str = "id, user_id, title, body, data, is_read, read_at, created_at";

/// Lista as notificações do usuário autenticado
#[utoipa::path(
    get,
    path = "/api/push",
    tag = "Push",
    security(("bearer_auth" = [])),
    params(
        ("page" = Option<u32>, Query, description = "Page number (default: 1)"),
        ("limit" = Option<u32>, Query, description = "Items per page (default: 20)")
    ),
    responses(
        (status = 200, description = "Notificações carregadas", body = PushNotificationListResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_notifications(
    State(state): State<AppState>,
    AuthUser { user_id, .. }: AuthUser,
    Query(query): Query<PushQuery>,
) -> AppResult<Json<PushNotificationListResponse>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * limit;

    let sql = format!(
        "SELECT {} FROM notifications WHERE user_id = $1 \
         ORDER BY created_at DESC LIMIT $2 OFFSET $3",
        PUSH_COLUMNS
    );

    let notifications = sqlx::query_as::<_, PushNotificationRecord>(&sql)
        .bind(user_id)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&state.db)
        .await
        .map_err(|e| {
            tracing::error!("Falha ao buscar notificações do user {}: {}", user_id, e);
            AppError::internal("Falha ao carregar notificações")
        })?;

    let total: i64 =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM notifications WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&state.db)
            .await?;

    let unread_count: i64 = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = false",
    )
    .bind(user_id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(PushNotificationListResponse {
        data: notifications
            .into_iter()
            .map(PushNotificationResponse::from)
            .collect(),
        total: total as u32,
        page,
        limit,
        unread_count,
    }))
}

/// Marca uma notificação como lida
#[utoipa::path(
    put,
    path = "/api/push/{id}/read",
    tag = "Push",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Notificação marcada como lida", body = MarkReadResponse),
        (status = 404, description = "Notificação não encontrada")
    )
)]
pub async fn mark_as_read(
    State(state): State<AppState>,
    AuthUser { user_id, .. }: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<Json<MarkReadResponse>> {
    let updated: Option<i32> = sqlx::query_scalar::<_, i32>(
        "UPDATE notifications SET is_read = true, read_at = COALESCE(read_at, NOW()) \
         WHERE id = $1 AND user_id = $2 RETURNING id",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(&state.db)
    .await?;

    if updated.is_none() {
        return Err(AppError::not_found("Notificação não encontrada"));
    }

    Ok(Json(MarkReadResponse {
        message: "Notificação marcada como lida".to_string(),
    }))
}

/// Marca todas as notificações como lidas (idempotente)
#[utoipa::path(
    put,
    path = "/api/push/read-all",
    tag = "Push",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Notificações marcadas como lidas", body = ReadAllResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn mark_all_as_read(
    State(state): State<AppState>,
    AuthUser { user_id, .. }: AuthUser,
) -> AppResult<Json<ReadAllResponse>> {
    let result = sqlx::query(
        "UPDATE notifications SET is_read = true, read_at = NOW() \
         WHERE user_id = $1 AND is_read = false",
    )
    .bind(user_id)
    .execute(&state.db)
    .await
    .map_err(|e| {
        tracing::error!("Falha ao marcar notificações do user {}: {}", user_id, e);
        AppError::internal("Falha ao marcar notificações como lidas")
    })?;

    let affected_count = result.rows_affected() as i64;

    Ok(Json(ReadAllResponse {
        message: format!("{} notificação(ões) marcada(s) como lida(s)", affected_count),
        affected_count,
    }))
}

/// Contador de não lidas do stream de push
#[utoipa::path(
    get,
    path = "/api/push/unread-count",
    tag = "Push",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Contador carregado", body = UnreadCountResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_unread_count(
    State(state): State<AppState>,
    AuthUser { user_id, .. }: AuthUser,
) -> AppResult<Json<UnreadCountResponse>> {
    let unread_count: i64 = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = false",
    )
    .bind(user_id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(UnreadCountResponse { unread_count }))
}

/// Limpa todas as notificações do usuário
#[utoipa::path(
    delete,
    path = "/api/push",
    tag = "Push",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Notificações removidas", body = ClearAllResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn clear_all(
    State(state): State<AppState>,
    AuthUser { user_id, .. }: AuthUser,
) -> AppResult<Json<ClearAllResponse>> {
    let result = sqlx::query("DELETE FROM notifications WHERE user_id = $1")
        .bind(user_id)
        .execute(&state.db)
        .await?;

    let deleted_count = result.rows_affected() as i64;

    let event = ChangeEvent::new("notifications", ChangeType::Delete, None, None);
    realtime::publish_to_user(&state.nats_client, user_id, event).await;

    Ok(Json(ClearAllResponse {
        message: format!("{} notificação(ões) removida(s)", deleted_count),
        deleted_count,
    }))
}

/// Badge combinado do app: retiradas não lidas + push não lidas numa única
/// consulta, para os dois contadores nunca divergirem entre si
#[utoipa::path(
    get,
    path = "/api/badge",
    tag = "Push",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Badge calculado", body = BadgeResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_badge(
    State(state): State<AppState>,
    AuthUser { user_id, .. }: AuthUser,
) -> AppResult<Json<BadgeResponse>> {
    let (pickup_unread, push_unread): (i64, i64) = sqlx::query_as::<_, (i64, i64)>(
        "SELECT \
            (SELECT COUNT(*) FROM pickup_requests \
              WHERE (guardian_id = $1 OR teacher_id = $1) \
                AND read_at IS NULL AND confirmed_at IS NULL AND completed_at IS NULL), \
            (SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = false)",
    )
    .bind(user_id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(BadgeResponse {
        pickup_unread,
        push_unread,
        total: pickup_unread + push_unread,
    }))
}

/// Endpoint interno para outros serviços criarem notificações. Protegido
/// por service token, não por JWT de usuário.
#[utoipa::path(
    post,
    path = "/api/internal/notify",
    tag = "Push",
    request_body = InternalNotifyRequest,
    responses(
        (status = 201, description = "Notificação criada", body = PushNotificationResponse),
        (status = 401, description = "Service token inválido")
    )
)]
pub async fn internal_notify(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<InternalNotifyRequest>,
) -> AppResult<(StatusCode, Json<PushNotificationResponse>)> {
    let service_token = headers
        .get("x-service-token")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::unauthorized("Service token missing"))?;

    if service_token != state.config.service_token {
        tracing::warn!("Tentativa de notificação interna com service token inválido");
        return Err(AppError::unauthorized("Service token inválido"));
    }

    let data = body.data.unwrap_or_else(|| serde_json::json!({}));

    let sql = format!(
        "INSERT INTO notifications (user_id, title, body, data) \
         VALUES ($1, $2, $3, $4) RETURNING {}",
        PUSH_COLUMNS
    );

    let record = sqlx::query_as::<_, PushNotificationRecord>(&sql)
        .bind(body.user_id)
        .bind(&body.title)
        .bind(&body.body)
        .bind(&data)
        .fetch_one(&state.db)
        .await?;

    // INSERT incremental no feed + entrega no dispositivo
    let event = ChangeEvent::new(
        "notifications",
        ChangeType::Insert,
        serde_json::to_value(&record).ok(),
        None,
    );
    realtime::publish_to_user(&state.nats_client, record.user_id, event).await;

    expo::send_to_user(
        &state.db,
        state.push_sender.as_ref(),
        record.user_id,
        &record.title,
        &record.body,
        record.data.clone(),
    )
    .await;

    Ok((StatusCode::CREATED, Json(PushNotificationResponse::from(record))))
}
