// Feed de mudanças em tempo real - publica eventos row-level via NATS
//
// Toda mutação comitada gera um ChangeEvent no subject do usuário afetado.
// O payload sempre carrega a linha nova e a antiga, então o app consegue
// fazer merge incremental sem refetch, com uma única estratégia de
// reconciliação para todas as tabelas.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tipo do evento de mudança, espelhando o change feed row-level
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeType {
    Insert,
    Update,
    Delete,
}

/// Evento de mudança entregue aos assinantes: { table, event, new, old }
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: String,
    pub event: ChangeType,
    pub new: Option<serde_json::Value>,
    pub old: Option<serde_json::Value>,
    pub emitted_at: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn new(
        table: &str,
        event: ChangeType,
        new: Option<serde_json::Value>,
        old: Option<serde_json::Value>,
    ) -> Self {
        Self {
            table: table.to_string(),
            event,
            new,
            old,
            emitted_at: Utc::now(),
        }
    }
}

/// Subject NATS por usuário: cada sessão WebSocket assina só o seu
pub fn user_subject(user_id: i32) -> String {
    format!("realtime.user.{}", user_id)
}

/// Publica um evento de mudança para um usuário. Best-effort: NATS fora
/// do ar não falha a requisição que originou a mutação, o REST continua
/// sendo a fonte de verdade
pub async fn publish_to_user(
    nats_client: &Option<async_nats::Client>,
    user_id: i32,
    event: ChangeEvent,
) {
    let Some(client) = nats_client else {
        tracing::debug!("NATS desativado, evento {:?} não publicado", event.event);
        return;
    };

    let payload = match serde_json::to_vec(&event) {
        Ok(p) => p,
        Err(e) => {
            tracing::error!("Falha ao serializar ChangeEvent: {}", e);
            return;
        }
    };

    if let Err(e) = client.publish(user_subject(user_id), payload.into()).await {
        tracing::warn!(
            "Falha ao publicar evento realtime para user {}: {}",
            user_id,
            e
        );
    }
}

/// Helper para publicar o mesmo evento para os dois lados da solicitação
pub async fn publish_to_both(
    nats_client: &Option<async_nats::Client>,
    guardian_id: i32,
    teacher_id: i32,
    event: ChangeEvent,
) {
    publish_to_user(nats_client, guardian_id, event.clone()).await;
    publish_to_user(nats_client, teacher_id, event).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_subject_format() {
        assert_eq!(user_subject(42), "realtime.user.42");
    }

    #[test]
    fn test_change_event_serde_shape() {
        let event = ChangeEvent::new(
            "pickup_requests",
            ChangeType::Update,
            Some(serde_json::json!({ "id": 1, "status": "confirmed" })),
            Some(serde_json::json!({ "id": 1, "status": "pending" })),
        );

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["table"], "pickup_requests");
        assert_eq!(json["event"], "UPDATE");
        assert_eq!(json["new"]["status"], "confirmed");
        assert_eq!(json["old"]["status"], "pending");

        let back: ChangeEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back.event, ChangeType::Update);
    }

    #[test]
    fn test_insert_event_has_no_old_row() {
        let event = ChangeEvent::new(
            "notifications",
            ChangeType::Insert,
            Some(serde_json::json!({ "id": 9 })),
            None,
        );

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "INSERT");
        assert!(json["old"].is_null());
    }
}
