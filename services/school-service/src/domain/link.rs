// Domain model de vínculo responsável-aluno
//
// O responsável pede o vínculo; um admin da escola aprova ou rejeita.
// A decisão é single-shot: depois de respondida a solicitação não muda mais.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LinkRequest {
    pub id: i32,
    pub guardian_id: i32,
    pub student_id: i32,
    pub relationship: String,
    pub status: String,
    pub response_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Pending,
    Approved,
    Rejected,
}

impl LinkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkStatus::Pending => "pending",
            LinkStatus::Approved => "approved",
            LinkStatus::Rejected => "rejected",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(LinkStatus::Pending),
            "approved" => Some(LinkStatus::Approved),
            "rejected" => Some(LinkStatus::Rejected),
            _ => None,
        }
    }

    /// Só pending aceita transição, e só para um estado final
    pub fn can_transition_to(&self, next: LinkStatus) -> bool {
        matches!(
            (self, next),
            (LinkStatus::Pending, LinkStatus::Approved)
                | (LinkStatus::Pending, LinkStatus::Rejected)
        )
    }
}

// Request do responsável pedindo vínculo com um aluno
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateLinkRequest {
    pub student_id: i32,
    pub relationship: String,
}

impl CreateLinkRequest {
    pub fn validate(&self) -> Result<(), String> {
        let relationship = self.relationship.trim();
        if relationship.is_empty() {
            return Err("Informe o parentesco (ex: mãe, pai, avó)".to_string());
        }
        if relationship.len() > 60 {
            return Err("Parentesco muito longo (máximo 60 caracteres)".to_string());
        }
        Ok(())
    }
}

// Decisão do admin sobre a solicitação de vínculo
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RespondLinkRequest {
    pub approve: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LinkRequestListResponse {
    pub data: Vec<LinkRequest>,
    pub total: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [LinkStatus::Pending, LinkStatus::Approved, LinkStatus::Rejected] {
            assert_eq!(LinkStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(LinkStatus::from_str("cancelled"), None);
    }

    #[test]
    fn test_single_shot_transitions() {
        assert!(LinkStatus::Pending.can_transition_to(LinkStatus::Approved));
        assert!(LinkStatus::Pending.can_transition_to(LinkStatus::Rejected));

        // Estados finais não transicionam
        assert!(!LinkStatus::Approved.can_transition_to(LinkStatus::Rejected));
        assert!(!LinkStatus::Rejected.can_transition_to(LinkStatus::Approved));
        assert!(!LinkStatus::Approved.can_transition_to(LinkStatus::Pending));
    }

    #[test]
    fn test_create_link_validation() {
        let ok = CreateLinkRequest {
            student_id: 1,
            relationship: "mãe".to_string(),
        };
        assert!(ok.validate().is_ok());

        let empty = CreateLinkRequest {
            student_id: 1,
            relationship: "  ".to_string(),
        };
        assert!(empty.validate().is_err());
    }
}
