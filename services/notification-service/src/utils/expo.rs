// Cliente do gateway de push da Expo
//
// O app registra um token opaco por dispositivo; a entrega é feita via
// HTTP POST no gateway com payload { to, title, body, data }, em lotes
// de no máximo 100 mensagens por requisição (limite da API da Expo).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::time::Duration;
use thiserror::Error;

/// Tamanho máximo de lote aceito pelo gateway da Expo
pub const MAX_BATCH_SIZE: usize = 100;

/// Mensagem outbound para o gateway de push
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PushMessage {
    pub to: String,
    pub title: String,
    pub body: String,
    pub data: serde_json::Value,
    pub sound: String,
    #[serde(rename = "channelId")]
    pub channel_id: String,
}

impl PushMessage {
    pub fn new(token: &str, title: &str, body: &str, data: serde_json::Value) -> Self {
        Self {
            to: token.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            data,
            sound: "default".to_string(),
            channel_id: "default".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum PushError {
    #[error("Falha na requisição ao gateway de push: {0}")]
    Gateway(#[from] reqwest::Error),

    #[error("Gateway de push retornou status {0}")]
    UnexpectedStatus(u16),
}

/// Abstração do transporte de push, mockável nos testes
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PushSender: Send + Sync {
    async fn send(&self, messages: Vec<PushMessage>) -> Result<(), PushError>;
}

/// Implementação real contra o gateway HTTP da Expo
pub struct ExpoPushClient {
    http_client: reqwest::Client,
    push_url: String,
}

impl ExpoPushClient {
    pub fn new(push_url: &str) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http_client,
            push_url: push_url.to_string(),
        })
    }
}

#[async_trait]
impl PushSender for ExpoPushClient {
    async fn send(&self, messages: Vec<PushMessage>) -> Result<(), PushError> {
        // Gateway limita o lote; acima disso a API rejeita a requisição
        for chunk in chunk_messages(messages) {
            let response = self
                .http_client
                .post(&self.push_url)
                .json(&chunk)
                .send()
                .await?;

            if !response.status().is_success() {
                return Err(PushError::UnexpectedStatus(response.status().as_u16()));
            }

            tracing::debug!("Lote de {} push(es) aceito pelo gateway", chunk.len());
        }

        Ok(())
    }
}

/// Divide as mensagens em lotes de até MAX_BATCH_SIZE
pub fn chunk_messages(messages: Vec<PushMessage>) -> Vec<Vec<PushMessage>> {
    messages
        .chunks(MAX_BATCH_SIZE)
        .map(|c| c.to_vec())
        .collect()
}

/// Entrega uma notificação para todos os dispositivos registrados do
/// usuário. Best-effort: falha de entrega é logada e nunca derruba a
/// requisição que originou o push
pub async fn send_to_user(
    pool: &PgPool,
    sender: &dyn PushSender,
    user_id: i32,
    title: &str,
    body: &str,
    data: serde_json::Value,
) {
    let tokens: Vec<String> = match sqlx::query_scalar::<_, String>(
        "SELECT token FROM push_tokens WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    {
        Ok(tokens) => tokens,
        Err(e) => {
            tracing::error!("Falha ao buscar push tokens do user {}: {}", user_id, e);
            return;
        }
    };

    if tokens.is_empty() {
        tracing::debug!("User {} não tem dispositivo registrado para push", user_id);
        return;
    }

    let messages: Vec<PushMessage> = tokens
        .iter()
        .map(|t| PushMessage::new(t, title, body, data.clone()))
        .collect();

    if let Err(e) = sender.send(messages).await {
        tracing::warn!("Falha ao entregar push para user {}: {}", user_id, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_message(n: usize) -> PushMessage {
        PushMessage::new(
            &format!("ExponentPushToken[{}]", n),
            "Retirada confirmada",
            "A professora confirmou a retirada de João",
            serde_json::json!({ "screen": "pickups" }),
        )
    }

    #[test]
    fn test_push_message_payload_shape() {
        let msg = sample_message(1);
        let json = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["to"], "ExponentPushToken[1]");
        assert_eq!(json["title"], "Retirada confirmada");
        assert_eq!(json["channelId"], "default");
        assert_eq!(json["data"]["screen"], "pickups");
    }

    #[test]
    fn test_chunking_respects_gateway_limit() {
        let messages: Vec<PushMessage> = (0..250).map(sample_message).collect();
        let chunks = chunk_messages(messages);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 100);
        assert_eq!(chunks[1].len(), 100);
        assert_eq!(chunks[2].len(), 50);
    }

    #[test]
    fn test_chunking_empty_is_empty() {
        assert!(chunk_messages(Vec::new()).is_empty());
    }

    #[tokio::test]
    async fn test_mock_sender_receives_messages() {
        let mut mock = MockPushSender::new();
        mock.expect_send()
            .withf(|msgs: &Vec<PushMessage>| {
                msgs.len() == 1 && msgs[0].title == "Retirada confirmada"
            })
            .times(1)
            .returning(|_| Ok(()));

        let result = mock.send(vec![sample_message(7)]).await;
        assert!(result.is_ok());
    }
}
