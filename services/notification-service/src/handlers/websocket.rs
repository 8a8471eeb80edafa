// WebSocket do feed de mudanças em tempo real
//
// Cada sessão autenticada assina o subject NATS do próprio usuário e
// recebe os ChangeEvents das tabelas que a afetam. A sessão cai no
// disconnect e o contador de conexões do usuário é liberado.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::Uri,
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::{config::AppState, error::AppError, realtime::{self, ChangeEvent}};

// Limite de sessões simultâneas do feed por usuário
const MAX_CONNECTIONS_PER_USER: usize = 3;

// Contador global de conexões ativas por usuário
lazy_static::lazy_static! {
    static ref FEED_CONNECTIONS: Arc<RwLock<HashMap<i32, usize>>> =
        Arc::new(RwLock::new(HashMap::new()));
}

// Mensagens trocadas no WebSocket do feed
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    // Client messages
    Ping,

    // Server messages
    Pong,
    Change { payload: ChangeEvent },
    Error { code: String, message: String },
}

/// Upgrade do WebSocket do feed. O JWT vem por query parameter porque
/// browsers/SDKs não mandam header Authorization no handshake de WS.
pub async fn ws_feed(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    uri: Uri,
) -> Result<Response, AppError> {
    let token = extract_token_from_query(&uri)?;

    let claims = shared::utils::jwt::validate_access_token(&token)
        .map_err(|_| AppError::unauthorized("Token inválido ou expirado"))?;
    let user_id = claims.sub;

    if state.nats_client.is_none() {
        return Err(AppError::Nats(
            "Feed em tempo real indisponível".to_string(),
        ));
    }

    // Limite de conexões por usuário
    {
        let mut connections = FEED_CONNECTIONS.write().await;
        let count = connections.entry(user_id).or_insert(0);
        if *count >= MAX_CONNECTIONS_PER_USER {
            return Err(AppError::websocket(
                "Limite de conexões simultâneas atingido",
            ));
        }
        *count += 1;
    }

    tracing::info!("Feed WebSocket aberto para user {}", user_id);

    Ok(ws.on_upgrade(move |socket| handle_feed(socket, state, user_id)))
}

/// Loop da sessão: NATS -> WebSocket num sentido, Ping/Pong no outro
async fn handle_feed(socket: WebSocket, state: AppState, user_id: i32) {
    let Some(nats_client) = state.nats_client.clone() else {
        release_connection(user_id).await;
        return;
    };

    let mut subscriber = match nats_client.subscribe(realtime::user_subject(user_id)).await {
        Ok(sub) => sub,
        Err(e) => {
            tracing::error!("Falha ao assinar subject do user {}: {}", user_id, e);
            release_connection(user_id).await;
            return;
        }
    };

    let (mut ws_tx, mut ws_rx) = socket.split();

    loop {
        tokio::select! {
            // Evento de mudança vindo do NATS
            nats_msg = subscriber.next() => {
                let Some(nats_msg) = nats_msg else { break };

                match serde_json::from_slice::<ChangeEvent>(&nats_msg.payload) {
                    Ok(event) => {
                        let ws_message = WsMessage::Change { payload: event };
                        let Ok(text) = serde_json::to_string(&ws_message) else { continue };

                        if ws_tx.send(Message::Text(text.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Payload NATS inválido no feed do user {}: {}", user_id, e);
                    }
                }
            }

            // Mensagem do cliente (keepalive ou close)
            client_msg = ws_rx.next() => {
                match client_msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Ok(WsMessage::Ping) = serde_json::from_str::<WsMessage>(&text) {
                            let Ok(pong) = serde_json::to_string(&WsMessage::Pong) else { continue };
                            if ws_tx.send(Message::Text(pong.into())).await.is_err() {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!("Erro no WebSocket do user {}: {}", user_id, e);
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    if let Err(e) = subscriber.unsubscribe().await {
        tracing::debug!("Falha no unsubscribe do user {}: {}", user_id, e);
    }

    release_connection(user_id).await;
    tracing::info!("Feed WebSocket encerrado para user {}", user_id);
}

/// Libera o slot de conexão do usuário
async fn release_connection(user_id: i32) {
    let mut connections = FEED_CONNECTIONS.write().await;
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
    use crate::realtime::ChangeType;

    #[test]
    fn test_ws_message_ping_roundtrip() {
        let parsed: WsMessage = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert!(matches!(parsed, WsMessage::Ping));

        let pong = serde_json::to_string(&WsMessage::Pong).unwrap();
        assert_eq!(pong, r#"{"type":"pong"}"#);
    }

    #[test]
    fn test_change_message_carries_event() {
        let event = ChangeEvent::new(
            "pickup_requests",
            ChangeType::Insert,
            Some(serde_json::json!({ "id": 5 })),
            None,
        );
        let msg = WsMessage::Change { payload: event };
        let json = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["type"], "change");
        assert_eq!(json["payload"]["table"], "pickup_requests");
        assert_eq!(json["payload"]["event"], "INSERT");
    }

    #[test]
    fn test_extract_token_from_query() {
        let uri: Uri = "/api/ws/feed?token=abc123".parse().unwrap();
        assert_eq!(extract_token_from_query(&uri).unwrap(), "abc123");

        let uri: Uri = "/api/ws/feed".parse().unwrap();
        assert!(extract_token_from_query(&uri).is_err());
    }
}
