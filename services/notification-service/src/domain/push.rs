use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

// Model de notificação genérica (tabela notifications)
#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct PushNotificationRecord {
    pub id: i32,
    pub user_id: i32,
    pub title: String,
    pub body: String,
    pub data: serde_json::Value,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

// Token de push registrado por dispositivo (tabela push_tokens)
#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct PushToken {
    pub id: i32,
    pub user_id: i32,
    pub token: String,
    pub platform: String,
    pub created_at: DateTime<Utc>,
}

// Request para registrar token do dispositivo
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterTokenRequest {
    #[schema(example = "ExponentPushToken[xxxxxxxxxxxxxxxxxxxxxx]")]
    pub token: String,
    #[schema(example = "android")]
    pub platform: String,
}

// Request interno de outro serviço para notificar um usuário
#[derive(Debug, Deserialize, ToSchema)]
pub struct InternalNotifyRequest {
    pub user_id: i32,
    #[schema(example = "Nova mensagem")]
    pub title: String,
    #[schema(example = "A professora Ana respondeu sua mensagem")]
    pub body: String,
    pub data: Option<serde_json::Value>,
}

// Response individual de notificação
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PushNotificationResponse {
    pub id: i32,
    pub title: String,
    pub body: String,
    pub data: serde_json::Value,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<PushNotificationRecord> for PushNotificationResponse {
    fn from(n: PushNotificationRecord) -> Self {
        Self {
            id: n.id,
            title: n.title,
            body: n.body,
            data: n.data,
            is_read: n.is_read,
            read_at: n.read_at,
            created_at: n.created_at,
        }
    }
}

// Response da lista paginada de notificações
#[derive(Debug, Serialize, ToSchema)]
pub struct PushNotificationListResponse {
    pub data: Vec<PushNotificationResponse>,
    pub total: u32,
    pub page: u32,
    pub limit: u32,
    pub unread_count: i64,
}

// Contador de não lidas (somente stream de push)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UnreadCountResponse {
    pub unread_count: i64,
}

// Badge combinado: retiradas não lidas + notificações não lidas,
// calculado numa única consulta para não haver contadores divergentes
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BadgeResponse {
    pub pickup_unread: i64,
    pub push_unread: i64,
    pub total: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_badge_total_is_sum_of_streams() {
        let badge = BadgeResponse {
            pickup_unread: 2,
            push_unread: 3,
            total: 5,
        };
        assert_eq!(badge.total, badge.pickup_unread + badge.push_unread);
    }

    #[test]
    fn test_push_response_keeps_data_bag() {
        let record = PushNotificationRecord {
            id: 1,
            user_id: 7,
            title: "Aviso".to_string(),
            body: "Reunião de pais na sexta".to_string(),
            data: serde_json::json!({ "screen": "notices", "notice_id": 4 }),
            is_read: false,
            read_at: None,
            created_at: Utc::now(),
        };

        let resp = PushNotificationResponse::from(record);
        assert_eq!(resp.data["screen"], "notices");
        assert!(!resp.is_read);
    }
}
