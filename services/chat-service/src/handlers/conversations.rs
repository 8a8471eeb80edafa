// Handlers de Conversation do Chat Service
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    config::AppState,
    domain::{ConversationResponse, CreateConversationRequest},
    error::{AppError, AppResult},
    handlers::websocket::{self, WsMessage},
    middleware::auth::AuthUser,
    repositories::{ConversationRepository, MessageRepository},
};

// Query parameters para pagination
#[derive(Debug, Deserialize, ToSchema)]
pub struct PaginationQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

// Response da lista de conversas
#[derive(Debug, Serialize, ToSchema)]
pub struct ConversationListResponse {
    pub conversations: Vec<ConversationResponse>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

// Response do mark read
#[derive(Debug, Serialize, ToSchema)]
pub struct ConversationReadResponse {
    pub message: String,
    pub affected_count: i64,
}

/// Abre uma conversa (ou reaproveita a existente do trio). O responsável
/// informa o professor, o professor informa o responsável; os vínculos com
/// o aluno são validados antes de criar.
#[utoipa::path(
    post,
    path = "/api/conversations",
    tag = "Conversations",
    security(("bearer_auth" = [])),
    request_body = CreateConversationRequest,
    responses(
        (status = 201, description = "Conversa disponível", body = ConversationResponse),
        (status = 403, description = "Sem vínculo com o aluno"),
        (status = 422, description = "Request inválido")
    )
)]
pub async fn create_conversation(
    State(state): State<AppState>,
    AuthUser { user_id, role }: AuthUser,
    Json(body): Json<CreateConversationRequest>,
) -> AppResult<(StatusCode, Json<ConversationResponse>)> {
    // Resolve o trio de acordo com quem está abrindo a conversa
    let (teacher_id, guardian_id) = match role.as_str() {
        "guardian" => {
            let teacher_id = body.teacher_id.ok_or_else(|| {
                AppError::validation("teacher_id é obrigatório para responsáveis")
            })?;
            (teacher_id, user_id)
        }
        "teacher" => {
            let guardian_id = body.guardian_id.ok_or_else(|| {
                AppError::validation("guardian_id é obrigatório para professores")
            })?;
            (user_id, guardian_id)
        }
        _ => {
            return Err(AppError::forbidden(
                "Apenas responsáveis e professores usam o chat",
            ))
        }
    };

    // Responsável precisa estar vinculado ao aluno
    let is_linked: bool = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM guardian_students WHERE guardian_id = $1 AND student_id = $2)",
    )
    .bind(guardian_id)
    .bind(body.student_id)
    .fetch_one(&state.db)
    .await?;

    if !is_linked {
        return Err(AppError::forbidden(
            "Aluno não está vinculado a este responsável",
        ));
    }

    // Professor precisa dar aula para a turma do aluno
    let teaches: bool = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM enrollments e \
          JOIN classes c ON c.id = e.class_id \
          WHERE e.student_id = $1 AND c.teacher_id = $2)",
    )
    .bind(body.student_id)
    .bind(teacher_id)
    .fetch_one(&state.db)
    .await?;

    if !teaches {
        return Err(AppError::forbidden(
            "Professor não leciona para a turma deste aluno",
        ));
    }

    let repo = ConversationRepository::new(state.db.clone());
    let conversation_id = repo
        .find_or_create(teacher_id, guardian_id, body.student_id)
        .await?;

    let response = repo
        .get_response(conversation_id, user_id)
        .await?
        .ok_or_else(|| AppError::internal("Conversa criada mas não encontrada"))?;

    tracing::info!(
        "Conversa {} disponível - professor {}, responsável {}, aluno {}",
        conversation_id,
        teacher_id,
        guardian_id,
        body.student_id
    );

    Ok((StatusCode::CREATED, Json(response)))
}

/// Lista as conversas do usuário com preview e contador de não lidas
#[utoipa::path(
    get,
    path = "/api/conversations",
    tag = "Conversations",
    security(("bearer_auth" = [])),
    params(
        ("limit" = Option<i64>, Query, description = "Items per page (default: 20)"),
        ("offset" = Option<i64>, Query, description = "Offset (default: 0)")
    ),
    responses(
        (status = 200, description = "Conversas carregadas", body = ConversationListResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_conversations(
    State(state): State<AppState>,
    AuthUser { user_id, .. }: AuthUser,
    Query(query): Query<PaginationQuery>,
) -> AppResult<Json<ConversationListResponse>> {
    let limit = query.limit.unwrap_or(20).clamp(1, 100);
    let offset = query.offset.unwrap_or(0).max(0);

    let repo = ConversationRepository::new(state.db.clone());
    let conversations = repo.list_for_user(user_id, limit, offset).await?;
    let total = repo.count_for_user(user_id).await?;

    Ok(Json(ConversationListResponse {
        conversations,
        total,
        limit,
        offset,
    }))
}

/// Marca como lidas as mensagens recebidas na conversa (read receipt).
/// Idempotente: repetir a chamada afeta 0 mensagens.
#[utoipa::path(
    put,
    path = "/api/conversations/{id}/read",
    tag = "Conversations",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Conversation ID")),
    responses(
        (status = 200, description = "Mensagens marcadas como lidas", body = ConversationReadResponse),
        (status = 403, description = "Não participa desta conversa"),
        (status = 404, description = "Conversa não encontrada")
    )
)]
pub async fn mark_conversation_read(
    State(state): State<AppState>,
    AuthUser { user_id, .. }: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ConversationReadResponse>> {
    let conv_repo = ConversationRepository::new(state.db.clone());
    let conversation = conv_repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Conversa não encontrada"))?;

    if !conversation.is_participant(user_id) {
        return Err(AppError::forbidden("Não participa desta conversa"));
    }

    let msg_repo = MessageRepository::new(state.db.clone());
    let affected = msg_repo.mark_conversation_read(id, user_id).await?;

    // Read receipt em tempo real para o outro lado
    if affected > 0 {
        websocket::publish_ws_message(
            &state.nats_client,
            id,
            &WsMessage::MessagesRead {
                conversation_id: id,
                read_by: user_id,
            },
        )
        .await;
    }

    Ok(Json(ConversationReadResponse {
        message: format!("{} mensagem(ns) marcada(s) como lida(s)", affected),
        affected_count: affected as i64,
    }))
}
