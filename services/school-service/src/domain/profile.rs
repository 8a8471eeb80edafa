// Domain model de Profile (dados públicos do usuário)
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Profile {
    pub id: i32,
    pub name: String,
    pub role: String,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Request de atualização do próprio perfil. Campos omitidos ficam como estão.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
}

impl UpdateProfileRequest {
    /// Valida os campos presentes sem exigir os ausentes
    pub fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err("Nome não pode ser vazio".to_string());
            }
            if name.len() > 120 {
                return Err("Nome muito longo (máximo 120 caracteres)".to_string());
            }
        }

        if let Some(phone) = &self.phone {
            if !phone.trim().is_empty() && !shared::utils::validation::is_valid_phone(phone) {
                return Err("Telefone inválido".to_string());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_profile_partial_fields() {
        let req = UpdateProfileRequest {
            name: Some("Maria Souza".to_string()),
            phone: None,
            avatar_url: None,
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_update_profile_rejects_empty_name() {
        let req = UpdateProfileRequest {
            name: Some("   ".to_string()),
            phone: None,
            avatar_url: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_update_profile_rejects_bad_phone() {
        let req = UpdateProfileRequest {
            name: None,
            phone: Some("abc".to_string()),
            avatar_url: None,
        };
        assert!(req.validate().is_err());
    }
}
