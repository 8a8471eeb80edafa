// Domain model dos itens da cantina
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CanteenItem {
    pub id: i32,
    pub name: String,
    pub unit_price: f64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateItemRequest {
    pub name: String,
    pub unit_price: f64,
}

impl CreateItemRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Nome do item é obrigatório".to_string());
        }
        if self.name.len() > 120 {
            return Err("Nome do item muito longo (máximo 120 caracteres)".to_string());
        }
        if !shared::utils::validation::is_valid_price(self.unit_price) {
            return Err("Preço inválido".to_string());
        }
        Ok(())
    }
}

// Atualização parcial: campos omitidos ficam como estão
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateItemRequest {
    pub name: Option<String>,
    pub unit_price: Option<f64>,
    pub active: Option<bool>,
}

impl UpdateItemRequest {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err("Nome do item não pode ser vazio".to_string());
            }
        }
        if let Some(price) = self.unit_price {
            if !shared::utils::validation::is_valid_price(price) {
                return Err("Preço inválido".to_string());
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ItemListResponse {
    pub data: Vec<CanteenItem>,
    pub total: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_item_validation() {
        let ok = CreateItemRequest {
            name: "Suco de laranja".to_string(),
            unit_price: 4.50,
        };
        assert!(ok.validate().is_ok());

        let negative = CreateItemRequest {
            unit_price: -1.0,
            ..ok.clone()
        };
        assert!(negative.validate().is_err());

        let empty = CreateItemRequest {
            name: " ".to_string(),
            ..ok
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_update_item_partial() {
        let req = UpdateItemRequest {
            name: None,
            unit_price: None,
            active: Some(false),
        };
        assert!(req.validate().is_ok());
    }
}
