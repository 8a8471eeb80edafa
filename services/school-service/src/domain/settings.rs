// Domain model das configurações da escola (linha única)
use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct SchoolSettings {
    pub id: i32,
    pub school_name: String,
    pub pickup_opens_at: NaiveTime,
    pub pickup_closes_at: NaiveTime,
    pub canteen_billing_day: i32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateSettingsRequest {
    pub school_name: Option<String>,
    pub pickup_opens_at: Option<NaiveTime>,
    pub pickup_closes_at: Option<NaiveTime>,
    pub canteen_billing_day: Option<i32>,
}

impl UpdateSettingsRequest {
    /// Valida os campos presentes e a coerência da janela de retirada
    pub fn validate(&self, current: &SchoolSettings) -> Result<(), String> {
        if let Some(name) = &self.school_name {
            if name.trim().is_empty() {
                return Err("Nome da escola não pode ser vazio".to_string());
            }
        }

        if let Some(day) = self.canteen_billing_day {
            // Dia 29+ não existe em todo mês
            if !(1..=28).contains(&day) {
                return Err("Dia de fechamento da cantina deve estar entre 1 e 28".to_string());
            }
        }

        let opens = self.pickup_opens_at.unwrap_or(current.pickup_opens_at);
        let closes = self.pickup_closes_at.unwrap_or(current.pickup_closes_at);
        if opens >= closes {
            return Err("Horário de abertura deve ser antes do fechamento".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn current() -> SchoolSettings {
        SchoolSettings {
            id: 1,
            school_name: "Universo do Saber".to_string(),
            pickup_opens_at: NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
            pickup_closes_at: NaiveTime::from_hms_opt(18, 30, 0).unwrap(),
            canteen_billing_day: 5,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_billing_day_bounds() {
        let req = UpdateSettingsRequest {
            school_name: None,
            pickup_opens_at: None,
            pickup_closes_at: None,
            canteen_billing_day: Some(29),
        };
        assert!(req.validate(&current()).is_err());

        let req = UpdateSettingsRequest {
            canteen_billing_day: Some(28),
            ..req
        };
        assert!(req.validate(&current()).is_ok());
    }

    #[test]
    fn test_pickup_window_coherence() {
        // Fecha antes de abrir, combinando campo novo com o atual
        let req = UpdateSettingsRequest {
            school_name: None,
            pickup_opens_at: None,
            pickup_closes_at: Some(NaiveTime::from_hms_opt(9, 0, 0).unwrap()),
            canteen_billing_day: None,
        };
        assert!(req.validate(&current()).is_err());

        let req = UpdateSettingsRequest {
            pickup_closes_at: Some(NaiveTime::from_hms_opt(17, 0, 0).unwrap()),
            ..req
        };
        assert!(req.validate(&current()).is_ok());
    }
}
