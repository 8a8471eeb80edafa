// Domain model de Conversation
//
// Uma conversa é única por trio (professor, responsável, aluno): o mesmo
// responsável e o mesmo professor têm uma conversa por aluno em comum.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Conversation {
    pub id: i32,
    pub teacher_id: i32,
    pub guardian_id: i32,
    pub student_id: i32,
    pub last_message: Option<String>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Só os dois lados do trio participam da conversa
    pub fn is_participant(&self, user_id: i32) -> bool {
        self.teacher_id == user_id || self.guardian_id == user_id
    }

    /// O outro lado da conversa, do ponto de vista de user_id
    pub fn counterpart_of(&self, user_id: i32) -> Option<i32> {
        if self.teacher_id == user_id {
            Some(self.guardian_id)
        } else if self.guardian_id == user_id {
            Some(self.teacher_id)
        } else {
            None
        }
    }
}

// Request para abrir (ou reaproveitar) uma conversa.
// Responsável informa o professor; professor informa o responsável.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateConversationRequest {
    pub teacher_id: Option<i32>,
    pub guardian_id: Option<i32>,
    pub student_id: i32,
}

// Response de conversa com os dados que a lista do app precisa
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ConversationResponse {
    pub id: i32,
    pub teacher_id: i32,
    pub guardian_id: i32,
    pub student_id: i32,
    pub teacher_name: String,
    pub guardian_name: String,
    pub student_name: String,
    pub last_message: Option<String>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub unread_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_conversation() -> Conversation {
        Conversation {
            id: 1,
            teacher_id: 30,
            guardian_id: 10,
            student_id: 20,
            last_message: None,
            last_message_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_participants() {
        let conv = sample_conversation();
        assert!(conv.is_participant(30));
        assert!(conv.is_participant(10));
        assert!(!conv.is_participant(20)); // aluno não participa do chat
        assert!(!conv.is_participant(99));
    }

    #[test]
    fn test_counterpart() {
        let conv = sample_conversation();
        assert_eq!(conv.counterpart_of(30), Some(10));
        assert_eq!(conv.counterpart_of(10), Some(30));
        assert_eq!(conv.counterpart_of(99), None);
    }
}
