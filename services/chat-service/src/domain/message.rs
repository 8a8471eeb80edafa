// Domain model de Message
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Message {
    pub id: i32,
    pub conversation_id: i32,
    pub sender_id: i32,
    pub content: String,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

// Request para enviar mensagem
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateMessageRequest {
    #[schema(example = "Bom dia! O João vai sair mais cedo hoje?")]
    pub content: String,
}

// Response de mensagem individual
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub id: i32,
    pub conversation_id: i32,
    pub sender_id: i32,
    pub content: String,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Message> for MessageResponse {
    fn from(m: Message) -> Self {
        Self {
            id: m.id,
            conversation_id: m.conversation_id,
            sender_id: m.sender_id,
            content: m.content,
            is_read: m.is_read,
            read_at: m.read_at,
            created_at: m.created_at,
        }
    }
}

// Indicador de digitação propagado via NATS para a conversa
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypingIndicator {
    pub conversation_id: i32,
    pub user_id: i32,
    pub is_typing: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typing_indicator_serde() {
        let indicator = TypingIndicator {
            conversation_id: 3,
            user_id: 7,
            is_typing: true,
        };

        let json = serde_json::to_value(&indicator).unwrap();
        assert_eq!(json["conversation_id"], 3);
        assert_eq!(json["is_typing"], true);

        let back: TypingIndicator = serde_json::from_value(json).unwrap();
        assert!(back.is_typing);
    }
}
