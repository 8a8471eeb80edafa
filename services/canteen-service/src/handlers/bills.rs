// Handlers das faturas mensais

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::{
    config::AppState,
    domain::{Bill, BillListResponse, BillStatus},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
};

const BILL_COLUMNS: &str =
    "id, student_id, reference_month, total, status, created_at, updated_at, paid_at";

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct BillListQuery {
    /// Filtro por aluno (apenas admin; responsável sempre vê os vinculados)
    pub student_id: Option<i32>,
    /// Filtro por mês YYYY-MM
    pub month: Option<String>,
    /// Filtro por status (open, closed, paid)
    pub status: Option<String>,
}

/// Faturas visíveis: responsável vê as dos alunos vinculados, admin vê todas
/// com filtros opcionais.
#[utoipa::path(
    get,
    path = "/api/bills",
    tag = "Bills",
    security(("bearer_auth" = [])),
    params(BillListQuery),
    responses(
        (status = 200, description = "Faturas visíveis", body = BillListResponse)
    )
)]
pub async fn list_bills(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<BillListQuery>,
) -> AppResult<Json<BillListResponse>> {
    if let Some(status) = &query.status {
        if BillStatus::from_str(status).is_none() {
            return Err(AppError::validation(
                "Status inválido (use open, closed ou paid)",
            ));
        }
    }

    let data = if auth.is_admin() {
        sqlx::query_as::<_, Bill>(&format!(
            "SELECT {} FROM canteen_bills \
             WHERE ($1::int IS NULL OR student_id = $1) \
               AND ($2::text IS NULL OR reference_month = $2) \
               AND ($3::text IS NULL OR status = $3) \
             ORDER BY reference_month DESC, student_id ASC",
            BILL_COLUMNS
        ))
        .bind(query.student_id)
        .bind(query.month.as_deref())
        .bind(query.status.as_deref())
        .fetch_all(&state.db)
        .await?
    } else if auth.is_guardian() {
        sqlx::query_as::<_, Bill>(&format!(
            "SELECT b.{} FROM canteen_bills b \
             INNER JOIN guardian_students gs \
                ON gs.student_id = b.student_id AND gs.guardian_id = $1 \
             WHERE ($2::text IS NULL OR b.reference_month = $2) \
             ORDER BY b.reference_month DESC",
            BILL_COLUMNS.replace(", ", ", b.")
        ))
        .bind(auth.user_id)
        .bind(query.month.as_deref())
        .fetch_all(&state.db)
        .await?
    } else {
        return Err(AppError::forbidden(
            "Professores não acessam faturas da cantina",
        ));
    };

    let total = data.len() as i64;
    Ok(Json(BillListResponse { data, total }))
}

/// Marca a fatura como paga (admin). Check-and-set: só sai de open ou closed,
/// pagar duas vezes dá 409.
#[utoipa::path(
    put,
    path = "/api/bills/{id}/pay",
    tag = "Bills",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "ID da fatura")),
    responses(
        (status = 200, description = "Fatura paga", body = Bill),
        (status = 403, description = "Apenas admins"),
        (status = 404, description = "Fatura não encontrada"),
        (status = 409, description = "Fatura já estava paga")
    )
)]
pub async fn pay_bill(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(bill_id): Path<i32>,
) -> AppResult<Json<Bill>> {
    if !auth.is_admin() {
        return Err(AppError::forbidden("Apenas admins dão baixa em faturas"));
    }

    // Busca antes para diferenciar 404 de 409
    let exists: bool =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM canteen_bills WHERE id = $1)")
            .bind(bill_id)
            .fetch_one(&state.db)
            .await?;
    if !exists {
        return Err(AppError::not_found("Fatura não encontrada"));
    }

    let bill = sqlx::query_as::<_, Bill>(&format!(
        "UPDATE canteen_bills \
         SET status = 'paid', paid_at = NOW(), updated_at = NOW() \
         WHERE id = $1 AND status IN ('open', 'closed') \
         RETURNING {}",
        BILL_COLUMNS
    ))
    .bind(bill_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::conflict("Fatura já estava paga"))?;

    tracing::info!(
        "Fatura {} paga - aluno {} R$ {:.2}",
        bill.id,
        bill.student_id,
        bill.total
    );

    Ok(Json(bill))
}
