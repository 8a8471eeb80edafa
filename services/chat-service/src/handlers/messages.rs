// Handlers de Message do Chat Service
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    config::AppState,
    domain::{CreateMessageRequest, MessageResponse},
    error::{AppError, AppResult},
    handlers::conversations::PaginationQuery,
    handlers::websocket::{self, WsMessage},
    middleware::auth::AuthUser,
    repositories::{ConversationRepository, MessageRepository},
    utils::notifier,
};

// Response da lista de mensagens
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageListResponse {
    pub messages: Vec<MessageResponse>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Mensagens da conversa em ordem cronológica, somente para participantes
#[utoipa::path(
    get,
    path = "/api/conversations/{id}/messages",
    tag = "Messages",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Conversation ID"),
        ("limit" = Option<i64>, Query, description = "Items per page (default: 50)"),
        ("offset" = Option<i64>, Query, description = "Offset (default: 0)")
    ),
    responses(
        (status = 200, description = "Mensagens carregadas", body = MessageListResponse),
        (status = 403, description = "Não participa desta conversa"),
        (status = 404, description = "Conversa não encontrada")
    )
)]
pub async fn get_messages(
    State(state): State<AppState>,
    AuthUser { user_id, .. }: AuthUser,
    Path(id): Path<i32>,
    Query(query): Query<PaginationQuery>,
) -> AppResult<Json<MessageListResponse>> {
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let offset = query.offset.unwrap_or(0).max(0);

    let conv_repo = ConversationRepository::new(state.db.clone());
    let conversation = conv_repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Conversa não encontrada"))?;

    if !conversation.is_participant(user_id) {
        return Err(AppError::forbidden("Não participa desta conversa"));
    }

    let msg_repo = MessageRepository::new(state.db.clone());
    let messages = msg_repo.list_for_conversation(id, limit, offset).await?;
    let total = msg_repo.count_for_conversation(id).await?;

    Ok(Json(MessageListResponse {
        messages: messages.into_iter().map(MessageResponse::from).collect(),
        total,
        limit,
        offset,
    }))
}

/// Envia mensagem de texto na conversa. Propaga em tempo real via NATS e
/// pede ao notification-service para notificar o outro participante.
#[utoipa::path(
    post,
    path = "/api/conversations/{id}/messages",
    tag = "Messages",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Conversation ID")),
    request_body = CreateMessageRequest,
    responses(
        (status = 201, description = "Mensagem enviada", body = MessageResponse),
        (status = 403, description = "Não participa desta conversa"),
        (status = 422, description = "Conteúdo inválido")
    )
)]
pub async fn send_message(
    State(state): State<AppState>,
    AuthUser { user_id, .. }: AuthUser,
    Path(id): Path<i32>,
    Json(body): Json<CreateMessageRequest>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    if !shared::utils::validation::is_valid_message_content(&body.content) {
        return Err(AppError::validation(
            "A mensagem é obrigatória (máximo de 2000 caracteres)",
        ));
    }

    let conv_repo = ConversationRepository::new(state.db.clone());
    let conversation = conv_repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Conversa não encontrada"))?;

    if !conversation.is_participant(user_id) {
        return Err(AppError::forbidden("Não participa desta conversa"));
    }

    let content = shared::utils::validation::sanitize_html(body.content.trim());

    let msg_repo = MessageRepository::new(state.db.clone());
    let message = msg_repo.create(id, user_id, &content).await?;

    conv_repo.touch_last_message(id, &content).await?;

    tracing::info!("Mensagem {} enviada na conversa {}", message.id, id);

    // Fanout em tempo real para os assinantes da conversa
    websocket::publish_ws_message(
        &state.nats_client,
        id,
        &WsMessage::NewMessage {
            conversation_id: id,
            sender_id: user_id,
            message: serde_json::to_value(MessageResponse::from(message.clone()))
                .unwrap_or_default(),
        },
    )
    .await;

    // Notificação push para o outro lado, via notification-service
    if let Some(counterpart) = conversation.counterpart_of(user_id) {
        notifier::notify_user(
            &state,
            counterpart,
            "Nova mensagem",
            &content,
            serde_json::json!({ "screen": "chat", "conversation_id": id }),
        )
        .await;
    }

    Ok((StatusCode::CREATED, Json(MessageResponse::from(message))))
}
