// WebSocket Handler do chat em tempo real
//
// Cada socket fica preso a uma conversa (path param). As mensagens e os
// indicadores de digitação circulam pelo subject NATS da conversa, e o
// socket filtra o que foi originado pelo próprio usuário.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::Uri,
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::{
    config::AppState,
    domain::TypingIndicator,
    error::AppError,
    repositories::ConversationRepository,
};

// Limite de sockets de chat simultâneos por usuário
const MAX_CONNECTIONS_PER_USER: usize = 3;

lazy_static::lazy_static! {
    static ref CHAT_CONNECTIONS: Arc<RwLock<HashMap<i32, usize>>> =
        Arc::new(RwLock::new(HashMap::new()));
}

// Mensagens trocadas no WebSocket do chat
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    // Client messages
    Ping,
    TypingStart,
    TypingStop,

    // Server messages
    Pong,
    NewMessage {
        conversation_id: i32,
        sender_id: i32,
        message: serde_json::Value,
    },
    MessagesRead {
        conversation_id: i32,
        read_by: i32,
    },
    UserTyping {
        conversation_id: i32,
        user_id: i32,
        is_typing: bool,
    },
    Error {
        code: String,
        message: String,
    },
}

impl WsMessage {
    /// Quem originou o evento, para o socket filtrar eco do próprio usuário
    pub fn origin_user(&self) -> Option<i32> {
        match self {
            WsMessage::NewMessage { sender_id, .. } => Some(*sender_id),
            WsMessage::MessagesRead { read_by, .. } => Some(*read_by),
            WsMessage::UserTyping { user_id, .. } => Some(*user_id),
            _ => None,
        }
    }
}

/// Subject NATS da conversa
pub fn conversation_subject(conversation_id: i32) -> String {
    format!("chat.conversation.{}", conversation_id)
}

/// Publica uma WsMessage no subject da conversa (best-effort)
pub async fn publish_ws_message(
    nats_client: &Option<async_nats::Client>,
    conversation_id: i32,
    message: &WsMessage,
) {
    let Some(client) = nats_client else {
        tracing::debug!("NATS desativado, evento de chat não publicado");
        return;
    };

    let payload = match serde_json::to_vec(message) {
        Ok(p) => p,
        Err(e) => {
            tracing::error!("Falha ao serializar WsMessage: {}", e);
            return;
        }
    };

    if let Err(e) = client
        .publish(conversation_subject(conversation_id), payload.into())
        .await
    {
        tracing::warn!(
            "Falha ao publicar evento na conversa {}: {}",
            conversation_id,
            e
        );
    }
}

/// Upgrade do WebSocket do chat. JWT via query parameter, participação na
/// conversa validada antes do upgrade.
pub async fn ws_chat(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(conversation_id): Path<i32>,
    uri: Uri,
) -> Result<Response, AppError> {
    let token = extract_token_from_query(&uri)?;

    let claims = shared::utils::jwt::validate_access_token(&token)
        .map_err(|_| AppError::unauthorized("Token inválido ou expirado"))?;
    let user_id = claims.sub;

    let repo = ConversationRepository::new(state.db.clone());
    let conversation = repo
        .get_by_id(conversation_id)
        .await?
        .ok_or_else(|| AppError::not_found("Conversa não encontrada"))?;

    if !conversation.is_participant(user_id) {
        return Err(AppError::forbidden("Não participa desta conversa"));
    }

    if state.nats_client.is_none() {
        return Err(AppError::Nats("Chat em tempo real indisponível".to_string()));
    }

    {
        let mut connections = CHAT_CONNECTIONS.write().await;
        let count = connections.entry(user_id).or_insert(0);
        if *count >= MAX_CONNECTIONS_PER_USER {
            return Err(AppError::websocket(
                "Limite de conexões simultâneas atingido",
            ));
        }
        *count += 1;
    }

    tracing::info!(
        "Chat WebSocket aberto - user {} na conversa {}",
        user_id,
        conversation_id
    );

    Ok(ws.on_upgrade(move |socket| handle_chat(socket, state, conversation_id, user_id)))
}

/// Loop da sessão de chat
async fn handle_chat(socket: WebSocket, state: AppState, conversation_id: i32, user_id: i32) {
    let Some(nats_client) = state.nats_client.clone() else {
        release_connection(user_id).await;
        return;
    };

    let mut subscriber = match nats_client
        .subscribe(conversation_subject(conversation_id))
        .await
    {
        Ok(sub) => sub,
        Err(e) => {
            tracing::error!(
                "Falha ao assinar subject da conversa {}: {}",
                conversation_id,
                e
            );
            release_connection(user_id).await;
            return;
        }
    };

    let (mut ws_tx, mut ws_rx) = socket.split();

    loop {
        tokio::select! {
            // Evento da conversa vindo do NATS
            nats_msg = subscriber.next() => {
                let Some(nats_msg) = nats_msg else { break };

                let Ok(ws_message) = serde_json::from_slice::<WsMessage>(&nats_msg.payload) else {
                    tracing::warn!("Payload NATS inválido na conversa {}", conversation_id);
                    continue;
                };

                // Filtra o eco do próprio usuário
                if ws_message.origin_user() == Some(user_id) {
                    continue;
                }

                let Ok(text) = serde_json::to_string(&ws_message) else { continue };
                if ws_tx.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }

            // Mensagem do cliente
            client_msg = ws_rx.next() => {
                match client_msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<WsMessage>(&text) {
                            Ok(WsMessage::Ping) => {
                                let Ok(pong) = serde_json::to_string(&WsMessage::Pong) else { continue };
                                if ws_tx.send(Message::Text(pong.into())).await.is_err() {
                                    break;
                                }
                            }
                            Ok(parsed @ (WsMessage::TypingStart | WsMessage::TypingStop)) => {
                                let indicator = TypingIndicator {
                                    conversation_id,
                                    user_id,
                                    is_typing: matches!(parsed, WsMessage::TypingStart),
                                };
                                publish_ws_message(
                                    &state.nats_client,
                                    conversation_id,
                                    &WsMessage::UserTyping {
                                        conversation_id: indicator.conversation_id,
                                        user_id: indicator.user_id,
                                        is_typing: indicator.is_typing,
                                    },
                                )
                                .await;
                            }
                            _ => {}
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!("Erro no WebSocket da conversa {}: {}", conversation_id, e);
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    if let Err(e) = subscriber.unsubscribe().await {
        tracing::debug!("Falha no unsubscribe da conversa {}: {}", conversation_id, e);
    }

    release_connection(user_id).await;
    tracing::info!(
        "Chat WebSocket encerrado - user {} na conversa {}",
        user_id,
        conversation_id
    );
}

/// Libera o slot de conexão do usuário
async fn release_connection(user_id: i32) {
    let mut connections = CHAT_CONNECTIONS.write().await;
    if let Some(count) = connections.get_mut(&user_id) {
        *count = count.saturating_sub(1);
        if *count == 0 {
            connections.remove(&user_id);
        }
    }
}

/// Extrai o JWT token do query parameter
fn extract_token_from_query(uri: &Uri) -> Result<String, AppError> {
    let query = uri
        .query()
        .ok_or_else(|| AppError::unauthorized("Missing query parameters"))?;

    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        if key == "token" {
            return Ok(value.into_owned());
        }
    }

    Err(AppError::unauthorized("Missing token parameter"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversation_subject_format() {
        assert_eq!(conversation_subject(8), "chat.conversation.8");
    }

    #[test]
    fn test_ws_message_tagging() {
        let msg = WsMessage::NewMessage {
            conversation_id: 3,
            sender_id: 7,
            message: serde_json::json!({ "content": "oi" }),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "new_message");
        assert_eq!(json["sender_id"], 7);
    }

    #[test]
    fn test_origin_user_filtering() {
        let msg = WsMessage::UserTyping {
            conversation_id: 1,
            user_id: 9,
            is_typing: true,
        };
        assert_eq!(msg.origin_user(), Some(9));
        assert_eq!(WsMessage::Pong.origin_user(), None);
    }

    #[test]
    fn test_client_ping_parses() {
        let parsed: WsMessage = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert!(matches!(parsed, WsMessage::Ping));

        let parsed: WsMessage = serde_json::from_str(r#"{"type":"typing_start"}"#).unwrap();
        assert!(matches!(parsed, WsMessage::TypingStart));
    }
}
