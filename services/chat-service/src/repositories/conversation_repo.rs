// Repository de operações de Conversation
use sqlx::PgPool;

use crate::domain::{Conversation, ConversationResponse};

const CONVERSATION_COLUMNS: &str =
    "id, teacher_id, guardian_id, student_id, last_message, last_message_at, created_at, updated_at";

// Repository para operações de conversa no banco
#[derive(Clone)]
pub struct ConversationRepository {
    pool: PgPool,
}

impl ConversationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Abre a conversa do trio ou reaproveita a existente (unique no trio)
    pub async fn find_or_create(
        &self,
        teacher_id: i32,
        guardian_id: i32,
        student_id: i32,
    ) -> Result<i32, sqlx::Error> {
        let inserted: Option<i32> = sqlx::query_scalar::<_, i32>(
            "INSERT INTO conversations (teacher_id, guardian_id, student_id) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (teacher_id, guardian_id, student_id) DO NOTHING \
             RETURNING id",
        )
        .bind(teacher_id)
        .bind(guardian_id)
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await?;

        match inserted {
            Some(id) => Ok(id),
            None => {
                sqlx::query_scalar::<_, i32>(
                    "SELECT id FROM conversations \
                     WHERE teacher_id = $1 AND guardian_id = $2 AND student_id = $3",
                )
                .bind(teacher_id)
                .bind(guardian_id)
                .bind(student_id)
                .fetch_one(&self.pool)
                .await
            }
        }
    }

    // Get conversation by ID
    pub async fn get_by_id(&self, conversation_id: i32) -> Result<Option<Conversation>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM conversations WHERE id = $1",
            CONVERSATION_COLUMNS
        );

        sqlx::query_as::<_, Conversation>(&sql)
            .bind(conversation_id)
            .fetch_optional(&self.pool)
            .await
    }

    // Lista as conversas do usuário com nomes, preview e contador de não lidas
    pub async fn list_for_user(
        &self,
        user_id: i32,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ConversationResponse>, sqlx::Error> {
        sqlx::query_as::<_, ConversationResponse>(
            "SELECT c.id, c.teacher_id, c.guardian_id, c.student_id, \
                    c.last_message, c.last_message_at, c.created_at, c.updated_at, \
                    tp.name AS teacher_name, gp.name AS guardian_name, s.name AS student_name, \
                    (SELECT COUNT(*) FROM messages m \
                      WHERE m.conversation_id = c.id AND m.sender_id <> $1 AND m.is_read = false) \
                      AS unread_count \
             FROM conversations c \
             JOIN profiles tp ON tp.id = c.teacher_id \
             JOIN profiles gp ON gp.id = c.guardian_id \
             JOIN students s ON s.id = c.student_id \
             WHERE c.teacher_id = $1 OR c.guardian_id = $1 \
             ORDER BY c.last_message_at DESC NULLS LAST \
             LIMIT $2 OFFSET $3",
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    // Total de conversas do usuário
    pub async fn count_for_user(&self, user_id: i32) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM conversations WHERE teacher_id = $1 OR guardian_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
    }

    // Atualiza o preview da última mensagem
    pub async fn touch_last_message(
        &self,
        conversation_id: i32,
        preview: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE conversations \
             SET last_message = $2, last_message_at = NOW(), updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(conversation_id)
        .bind(preview)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // Conversa única com nomes e contador, do ponto de vista de user_id
    pub async fn get_response(
        &self,
        conversation_id: i32,
        user_id: i32,
    ) -> Result<Option<ConversationResponse>, sqlx::Error> {
        sqlx::query_as::<_, ConversationResponse>(
            "SELECT c.id, c.teacher_id, c.guardian_id, c.student_id, \
                    c.last_message, c.last_message_at, c.created_at, c.updated_at, \
                    tp.name AS teacher_name, gp.name AS guardian_name, s.name AS student_name, \
                    (SELECT COUNT(*) FROM messages m \
                      WHERE m.conversation_id = c.id AND m.sender_id <> $2 AND m.is_read = false) \
                      AS unread_count \
             FROM conversations c \
             JOIN profiles tp ON tp.id = c.teacher_id \
             JOIN profiles gp ON gp.id = c.guardian_id \
             JOIN students s ON s.id = c.student_id \
             WHERE c.id = $1",
        )
        .bind(conversation_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }
}
