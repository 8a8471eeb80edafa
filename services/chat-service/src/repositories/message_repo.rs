// Repository de operações de Message
use sqlx::PgPool;

use crate::domain::Message;

const MESSAGE_COLUMNS: &str =
    "id, conversation_id, sender_id, content, is_read, read_at, created_at";

// Repository para operações de mensagem no banco
#[derive(Clone)]
pub struct MessageRepository {
    pool: PgPool,
}

impl MessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Cria mensagem nova
    pub async fn create(
        &self,
        conversation_id: i32,
        sender_id: i32,
        content: &str,
    ) -> Result<Message, sqlx::Error> {
        let sql = format!(
            "INSERT INTO messages (conversation_id, sender_id, content) \
             VALUES ($1, $2, $3) RETURNING {}",
            MESSAGE_COLUMNS
        );

        sqlx::query_as::<_, Message>(&sql)
            .bind(conversation_id)
            .bind(sender_id)
            .bind(content)
            .fetch_one(&self.pool)
            .await
    }

    // Mensagens da conversa em ordem cronológica, paginadas
    pub async fn list_for_conversation(
        &self,
        conversation_id: i32,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Message>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM messages WHERE conversation_id = $1 \
             ORDER BY created_at ASC LIMIT $2 OFFSET $3",
            MESSAGE_COLUMNS
        );

        sqlx::query_as::<_, Message>(&sql)
            .bind(conversation_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
    }

    // Total de mensagens da conversa
    pub async fn count_for_conversation(&self, conversation_id: i32) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM messages WHERE conversation_id = $1")
            .bind(conversation_id)
            .fetch_one(&self.pool)
            .await
    }

    // Marca como lidas as mensagens do outro participante. Idempotente.
    pub async fn mark_conversation_read(
        &self,
        conversation_id: i32,
        reader_id: i32,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE messages SET is_read = true, read_at = NOW() \
             WHERE conversation_id = $1 AND sender_id <> $2 AND is_read = false",
        )
        .bind(conversation_id)
        .bind(reader_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
