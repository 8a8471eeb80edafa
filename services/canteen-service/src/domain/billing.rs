// Domain models do consumo e das faturas mensais da cantina
//
// Cada consumo congela o preço unitário do item no momento do registro e
// incrementa a fatura aberta do aluno no mês de referência. A fatura é única
// por (aluno, mês) e só sai de open/closed para paid.
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Consumption {
    pub id: i32,
    pub student_id: i32,
    pub item_id: i32,
    pub item_name: Option<String>,
    pub quantity: i32,
    pub unit_price: f64,
    pub consumed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecordConsumptionRequest {
    pub student_id: i32,
    pub item_id: i32,
    pub quantity: i32,
}

impl RecordConsumptionRequest {
    pub fn validate(&self) -> Result<(), String> {
        if !shared::utils::validation::is_valid_quantity(self.quantity) {
            return Err("Quantidade deve estar entre 1 e 50".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Bill {
    pub id: i32,
    pub student_id: i32,
    pub reference_month: String,
    pub total: f64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillStatus {
    Open,
    Closed,
    Paid,
}

impl BillStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillStatus::Open => "open",
            BillStatus::Closed => "closed",
            BillStatus::Paid => "paid",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "open" => Some(BillStatus::Open),
            "closed" => Some(BillStatus::Closed),
            "paid" => Some(BillStatus::Paid),
            _ => None,
        }
    }

    /// Paid é terminal; open fecha ou é pago direto
    pub fn can_transition_to(&self, next: BillStatus) -> bool {
        matches!(
            (self, next),
            (BillStatus::Open, BillStatus::Closed)
                | (BillStatus::Open, BillStatus::Paid)
                | (BillStatus::Closed, BillStatus::Paid)
        )
    }
}

/// Valor da linha de consumo, arredondado para centavos
pub fn line_total(quantity: i32, unit_price: f64) -> f64 {
    round_cents(quantity as f64 * unit_price)
}

/// Arredonda para 2 casas decimais
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Mês de referência no formato YYYY-MM
pub fn reference_month_of(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConsumptionListResponse {
    pub data: Vec<Consumption>,
    pub total_amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BillListResponse {
    pub data: Vec<Bill>,
    pub total: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_total_increments_exactly() {
        // 3 sucos a R$ 4,50 somam R$ 13,50 na fatura
        assert_eq!(line_total(3, 4.50), 13.50);
        assert_eq!(line_total(1, 0.01), 0.01);

        // Acumulação de duas linhas bate com a soma arredondada
        let bill_total = round_cents(line_total(3, 4.50) + line_total(2, 2.25));
        assert_eq!(bill_total, 18.00);
    }

    #[test]
    fn test_round_cents_handles_float_noise() {
        assert_eq!(round_cents(0.1 + 0.2), 0.30);
        assert_eq!(round_cents(10.005), 10.01);
    }

    #[test]
    fn test_reference_month_boundaries() {
        // Virada de mês gera fatura nova
        let january = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
        let february = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        assert_eq!(reference_month_of(january), "2025-01");
        assert_eq!(reference_month_of(february), "2025-02");
        assert_ne!(reference_month_of(january), reference_month_of(february));
    }

    #[test]
    fn test_bill_status_transitions() {
        assert!(BillStatus::Open.can_transition_to(BillStatus::Closed));
        assert!(BillStatus::Open.can_transition_to(BillStatus::Paid));
        assert!(BillStatus::Closed.can_transition_to(BillStatus::Paid));

        // Paga é estado final
        assert!(!BillStatus::Paid.can_transition_to(BillStatus::Open));
        assert!(!BillStatus::Paid.can_transition_to(BillStatus::Closed));
        assert!(!BillStatus::Closed.can_transition_to(BillStatus::Open));
    }

    #[test]
    fn test_quantity_validation() {
        let ok = RecordConsumptionRequest {
            student_id: 1,
            item_id: 1,
            quantity: 2,
        };
        assert!(ok.validate().is_ok());

        let zero = RecordConsumptionRequest {
            quantity: 0,
            ..ok.clone()
        };
        assert!(zero.validate().is_err());

        let too_many = RecordConsumptionRequest { quantity: 51, ..ok };
        assert!(too_many.validate().is_err());
    }
}
