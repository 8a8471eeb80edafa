use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

// Model principal da solicitação de retirada, espelhando a tabela pickup_requests
#[derive(Debug, Clone, FromRow, Serialize, ToSchema)]
pub struct PickupRequest {
    pub id: i32,
    pub guardian_id: i32,
    pub student_id: i32,
    pub teacher_id: i32,
    pub requested_at: DateTime<Utc>,
    pub reason: String,
    pub status: String,
    pub response_notes: Option<String>,
    pub read_at: Option<DateTime<Utc>>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl PickupRequest {
    /// "Não lida" é derivado, nunca armazenado: a solicitação é não lida
    /// enquanto nenhum dos três timestamps estiver preenchido
    pub fn is_unread(&self) -> bool {
        self.read_at.is_none() && self.confirmed_at.is_none() && self.completed_at.is_none()
    }
}

// Enum de status da solicitação de retirada
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PickupStatus {
    Pending,
    Confirmed,
    Rejected,
}

impl PickupStatus {
    pub fn as_str(&self) -> &str {
        match self {
            PickupStatus::Pending => "pending",
            PickupStatus::Confirmed => "confirmed",
            PickupStatus::Rejected => "rejected",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PickupStatus::Pending),
            "confirmed" => Some(PickupStatus::Confirmed),
            "rejected" => Some(PickupStatus::Rejected),
            _ => None,
        }
    }

    /// A transição é single-shot: só sai de pending, e pending nunca volta
    pub fn can_transition_to(&self, next: PickupStatus) -> bool {
        matches!(
            (self, next),
            (PickupStatus::Pending, PickupStatus::Confirmed)
                | (PickupStatus::Pending, PickupStatus::Rejected)
        )
    }
}

/// Campos que a resposta do professor grava na solicitação.
/// Regra dos timestamps: confirmar grava read_at + confirmed_at (nunca
/// completed_at); recusar grava read_at + completed_at (nunca confirmed_at).
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseStamp {
    pub status: PickupStatus,
    pub read_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ResponseStamp {
    pub fn for_decision(approve: bool, now: DateTime<Utc>) -> Self {
        if approve {
            Self {
                status: PickupStatus::Confirmed,
                read_at: now,
                confirmed_at: Some(now),
                completed_at: None,
            }
        } else {
            Self {
                status: PickupStatus::Rejected,
                read_at: now,
                confirmed_at: None,
                completed_at: Some(now),
            }
        }
    }
}

// Request para criar solicitação de retirada (responsável)
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePickupRequest {
    #[schema(example = 12)]
    pub student_id: i32,
    #[schema(example = "2026-08-24T16:30:00Z")]
    pub requested_at: DateTime<Utc>,
    #[schema(example = "Consulta médica")]
    pub reason: String,
}

// Request para responder solicitação (professor)
#[derive(Debug, Deserialize, ToSchema)]
pub struct RespondPickupRequest {
    #[schema(example = true)]
    pub approve: bool,
    #[schema(example = "Pode retirar na portaria principal")]
    pub notes: Option<String>,
}

// Response de uma solicitação individual, com o unread derivado
#[derive(Debug, Serialize, ToSchema)]
pub struct PickupResponse {
    pub id: i32,
    pub guardian_id: i32,
    pub student_id: i32,
    pub teacher_id: i32,
    pub requested_at: DateTime<Utc>,
    pub reason: String,
    pub status: String,
    pub response_notes: Option<String>,
    pub read_at: Option<DateTime<Utc>>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub unread: bool,
}

impl From<PickupRequest> for PickupResponse {
    fn from(req: PickupRequest) -> Self {
        let unread = req.is_unread();
        Self {
            id: req.id,
            guardian_id: req.guardian_id,
            student_id: req.student_id,
            teacher_id: req.teacher_id,
            requested_at: req.requested_at,
            reason: req.reason,
            status: req.status,
            response_notes: req.response_notes,
            read_at: req.read_at,
            confirmed_at: req.confirmed_at,
            completed_at: req.completed_at,
            created_at: req.created_at,
            unread,
        }
    }
}

// Response da lista paginada, com contador de não lidas
#[derive(Debug, Serialize, ToSchema)]
pub struct PickupListResponse {
    pub data: Vec<PickupResponse>,
    pub total: u32,
    pub page: u32,
    pub limit: u32,
    pub unread_count: i64,
}

// Response para mark as read
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MarkReadResponse {
    pub message: String,
}

// Response para read all
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReadAllResponse {
    pub message: String,
    pub affected_count: i64,
}

// Response para clear all
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ClearAllResponse {
    pub message: String,
    pub deleted_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_request() -> PickupRequest {
        PickupRequest {
            id: 1,
            guardian_id: 10,
            student_id: 20,
            teacher_id: 30,
            requested_at: Utc::now(),
            reason: "Consulta médica".to_string(),
            status: "pending".to_string(),
            response_notes: None,
            read_at: None,
            confirmed_at: None,
            completed_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_status_roundtrip() {
        for s in ["pending", "confirmed", "rejected"] {
            assert_eq!(PickupStatus::from_str(s).unwrap().as_str(), s);
        }
        assert_eq!(PickupStatus::from_str("cancelled"), None);
    }

    #[test]
    fn test_transition_is_single_shot() {
        assert!(PickupStatus::Pending.can_transition_to(PickupStatus::Confirmed));
        assert!(PickupStatus::Pending.can_transition_to(PickupStatus::Rejected));

        // Respondida nunca transiciona de novo
        assert!(!PickupStatus::Confirmed.can_transition_to(PickupStatus::Rejected));
        assert!(!PickupStatus::Rejected.can_transition_to(PickupStatus::Confirmed));
        assert!(!PickupStatus::Confirmed.can_transition_to(PickupStatus::Pending));
        assert!(!PickupStatus::Rejected.can_transition_to(PickupStatus::Pending));
    }

    #[test]
    fn test_new_request_is_unread() {
        let req = sample_request();
        assert!(req.is_unread());
    }

    #[test]
    fn test_any_timestamp_makes_request_read() {
        let mut req = sample_request();
        req.read_at = Some(Utc::now());
        assert!(!req.is_unread());

        let mut req = sample_request();
        req.confirmed_at = Some(Utc::now());
        assert!(!req.is_unread());

        let mut req = sample_request();
        req.completed_at = Some(Utc::now());
        assert!(!req.is_unread());
    }

    #[test]
    fn test_approve_stamp_sets_confirmed_never_completed() {
        let now = Utc::now();
        let stamp = ResponseStamp::for_decision(true, now);

        assert_eq!(stamp.status, PickupStatus::Confirmed);
        assert_eq!(stamp.read_at, now);
        assert_eq!(stamp.confirmed_at, Some(now));
        assert_eq!(stamp.completed_at, None);
    }

    #[test]
    fn test_reject_stamp_sets_completed_never_confirmed() {
        let now = Utc::now();
        let stamp = ResponseStamp::for_decision(false, now);

        assert_eq!(stamp.status, PickupStatus::Rejected);
        assert_eq!(stamp.read_at, now);
        assert_eq!(stamp.confirmed_at, None);
        assert_eq!(stamp.completed_at, Some(now));
    }

    #[test]
    fn test_responded_request_is_never_unread() {
        // Propriedade: respondida (confirmada ou recusada) implica lida,
        // porque a resposta sempre grava read_at
        for approve in [true, false] {
            let now = Utc::now();
            let stamp = ResponseStamp::for_decision(approve, now);

            let mut req = sample_request();
            req.status = stamp.status.as_str().to_string();
            req.read_at = Some(stamp.read_at);
            req.confirmed_at = stamp.confirmed_at;
            req.completed_at = stamp.completed_at;

            assert!(!req.is_unread());
        }
    }

    #[test]
    fn test_pickup_response_derives_unread() {
        let req = sample_request();
        let resp = PickupResponse::from(req);
        assert!(resp.unread);
        assert_eq!(resp.status, "pending");
    }
}
