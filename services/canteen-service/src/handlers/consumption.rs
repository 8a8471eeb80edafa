// Handlers do registro de consumo
//
// O registro do consumo e o acréscimo na fatura do mês acontecem na MESMA
// transação: ou os dois entram, ou nenhum.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::{
    config::AppState,
    domain::{
        line_total, reference_month_of, Bill, Consumption, ConsumptionListResponse,
        RecordConsumptionRequest,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
};

const BILL_COLUMNS: &str =
    "id, student_id, reference_month, total, status, created_at, updated_at, paid_at";

/// Registra um consumo e acrescenta o valor na fatura aberta do mês, criando
/// a fatura se for a primeira compra do período. Tudo em uma transação.
#[utoipa::path(
    post,
    path = "/api/consumption",
    tag = "Consumption",
    security(("bearer_auth" = [])),
    request_body = RecordConsumptionRequest,
    responses(
        (status = 201, description = "Consumo registrado, fatura atualizada", body = Bill),
        (status = 403, description = "Apenas admins"),
        (status = 404, description = "Aluno ou item não encontrado"),
        (status = 409, description = "Fatura do mês já fechada"),
        (status = 422, description = "Quantidade inválida")
    )
)]
pub async fn record_consumption(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<RecordConsumptionRequest>,
) -> AppResult<(StatusCode, Json<Bill>)> {
    if !auth.is_admin() {
        return Err(AppError::forbidden(
            "Apenas a equipe da cantina registra consumo",
        ));
    }

    body.validate().map_err(AppError::validation)?;

    let student_exists: bool =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM students WHERE id = $1)")
            .bind(body.student_id)
            .fetch_one(&state.db)
            .await?;
    if !student_exists {
        return Err(AppError::not_found("Aluno não encontrado"));
    }

    // Snapshot do preço: o valor cobrado é o do momento do consumo
    let unit_price: f64 = sqlx::query_scalar::<_, f64>(
        "SELECT unit_price FROM canteen_items WHERE id = $1 AND active = TRUE",
    )
    .bind(body.item_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::not_found("Item não encontrado ou desativado"))?;

    let now = Utc::now();
    let month = reference_month_of(now.date_naive());
    let amount = line_total(body.quantity, unit_price);

    let mut tx = state.db.begin().await?;

    sqlx::query(
        "INSERT INTO canteen_consumption (student_id, item_id, quantity, unit_price, consumed_at) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(body.student_id)
    .bind(body.item_id)
    .bind(body.quantity)
    .bind(unit_price)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    // Upsert da fatura do mês. O WHERE no DO UPDATE impede acréscimo em
    // fatura que já saiu de open.
    let bill = sqlx::query_as::<_, Bill>(&format!(
        "INSERT INTO canteen_bills (student_id, reference_month, total, status) \
         VALUES ($1, $2, $3, 'open') \
         ON CONFLICT (student_id, reference_month) DO UPDATE \
             SET total = canteen_bills.total + EXCLUDED.total, updated_at = NOW() \
             WHERE canteen_bills.status = 'open' \
         RETURNING {}",
        BILL_COLUMNS
    ))
    .bind(body.student_id)
    .bind(&month)
    .bind(amount)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(bill) = bill else {
        tx.rollback().await?;
        return Err(AppError::conflict(
            "A fatura deste mês já foi fechada, consumo não registrado",
        ));
    };

    tx.commit().await?;

    tracing::info!(
        "Consumo registrado - aluno {} item {} x{} (R$ {:.2}), fatura {} = R$ {:.2}",
        body.student_id,
        body.item_id,
        body.quantity,
        amount,
        bill.id,
        bill.total
    );

    Ok((StatusCode::CREATED, Json(bill)))
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ConsumptionQuery {
    pub student_id: i32,
    /// Mês de referência no formato YYYY-MM (default: mês atual)
    pub month: Option<String>,
}

/// Extrato de consumo de um aluno no mês. Responsável vinculado ou admin.
#[utoipa::path(
    get,
    path = "/api/consumption",
    tag = "Consumption",
    security(("bearer_auth" = [])),
    params(ConsumptionQuery),
    responses(
        (status = 200, description = "Extrato do mês", body = ConsumptionListResponse),
        (status = 403, description = "Aluno não vinculado ao responsável")
    )
)]
pub async fn list_consumption(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ConsumptionQuery>,
) -> AppResult<Json<ConsumptionListResponse>> {
    if !auth.is_admin() {
        let linked: bool = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM guardian_students \
             WHERE guardian_id = $1 AND student_id = $2)",
        )
        .bind(auth.user_id)
        .bind(query.student_id)
        .fetch_one(&state.db)
        .await?;

        if !linked {
            return Err(AppError::forbidden(
                "Você não está vinculado a este aluno",
            ));
        }
    }

    let month = match query.month {
        Some(m) => {
            if m.len() != 7 || m.as_bytes()[4] != b'-' {
                return Err(AppError::validation("Mês deve estar no formato YYYY-MM"));
            }
            m
        }
        None => reference_month_of(Utc::now().date_naive()),
    };

    let data = sqlx::query_as::<_, Consumption>(
        "SELECT cc.id, cc.student_id, cc.item_id, ci.name AS item_name, cc.quantity, \
                cc.unit_price, cc.consumed_at \
         FROM canteen_consumption cc \
         LEFT JOIN canteen_items ci ON ci.id = cc.item_id \
         WHERE cc.student_id = $1 AND to_char(cc.consumed_at, 'YYYY-MM') = $2 \
         ORDER BY cc.consumed_at DESC",
    )
    .bind(query.student_id)
    .bind(&month)
    .fetch_all(&state.db)
    .await?;

    let total_amount = crate::domain::round_cents(
        data.iter()
            .map(|c| line_total(c.quantity, c.unit_price))
            .sum(),
    );

    Ok(Json(ConsumptionListResponse { data, total_amount }))
}
