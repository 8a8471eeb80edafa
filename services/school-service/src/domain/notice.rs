// Domain model do mural de avisos
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Notice {
    pub id: i32,
    pub title: String,
    pub body: String,
    pub audience: String,
    pub author_id: i32,
    pub author_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeAudience {
    All,
    Guardians,
    Teachers,
}

impl NoticeAudience {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoticeAudience::All => "all",
            NoticeAudience::Guardians => "guardians",
            NoticeAudience::Teachers => "teachers",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "all" => Some(NoticeAudience::All),
            "guardians" => Some(NoticeAudience::Guardians),
            "teachers" => Some(NoticeAudience::Teachers),
            _ => None,
        }
    }

    /// Decide se um papel enxerga o aviso. Admin vê tudo.
    pub fn visible_to(&self, role: &str) -> bool {
        if role == "admin" {
            return true;
        }
        match self {
            NoticeAudience::All => true,
            NoticeAudience::Guardians => role == "guardian",
            NoticeAudience::Teachers => role == "teacher",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateNoticeRequest {
    pub title: String,
    pub body: String,
    pub audience: String,
}

impl CreateNoticeRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Título é obrigatório".to_string());
        }
        if self.title.len() > 200 {
            return Err("Título muito longo (máximo 200 caracteres)".to_string());
        }
        if self.body.trim().is_empty() {
            return Err("Conteúdo é obrigatório".to_string());
        }
        if self.body.len() > 5000 {
            return Err("Conteúdo muito longo (máximo 5000 caracteres)".to_string());
        }
        if NoticeAudience::from_str(&self.audience).is_none() {
            return Err("Público inválido (use all, guardians ou teachers)".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NoticeListResponse {
    pub data: Vec<Notice>,
    pub total: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audience_visibility() {
        assert!(NoticeAudience::All.visible_to("guardian"));
        assert!(NoticeAudience::All.visible_to("teacher"));

        assert!(NoticeAudience::Guardians.visible_to("guardian"));
        assert!(!NoticeAudience::Guardians.visible_to("teacher"));

        assert!(NoticeAudience::Teachers.visible_to("teacher"));
        assert!(!NoticeAudience::Teachers.visible_to("guardian"));

        // Admin enxerga qualquer público
        assert!(NoticeAudience::Guardians.visible_to("admin"));
        assert!(NoticeAudience::Teachers.visible_to("admin"));
    }

    #[test]
    fn test_create_notice_validation() {
        let ok = CreateNoticeRequest {
            title: "Reunião de pais".to_string(),
            body: "Sexta-feira às 19h no auditório".to_string(),
            audience: "guardians".to_string(),
        };
        assert!(ok.validate().is_ok());

        let bad_audience = CreateNoticeRequest {
            audience: "students".to_string(),
            ..ok.clone()
        };
        assert!(bad_audience.validate().is_err());

        let empty_title = CreateNoticeRequest {
            title: "".to_string(),
            ..ok
        };
        assert!(empty_title.validate().is_err());
    }
}
