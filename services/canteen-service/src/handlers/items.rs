// Handlers do cardápio da cantina

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::{
    config::AppState,
    domain::{CanteenItem, CreateItemRequest, ItemListResponse, UpdateItemRequest},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
};

const ITEM_COLUMNS: &str = "id, name, unit_price, active, created_at";

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ItemListQuery {
    /// Inclui itens desativados (apenas admin)
    pub include_inactive: Option<bool>,
}

/// Itens ativos do cardápio. Admin pode pedir os desativados também.
#[utoipa::path(
    get,
    path = "/api/items",
    tag = "Items",
    security(("bearer_auth" = [])),
    params(ItemListQuery),
    responses(
        (status = 200, description = "Itens do cardápio", body = ItemListResponse)
    )
)]
pub async fn list_items(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ItemListQuery>,
) -> AppResult<Json<ItemListResponse>> {
    let include_inactive = auth.is_admin() && query.include_inactive.unwrap_or(false);

    let data = if include_inactive {
        sqlx::query_as::<_, CanteenItem>(&format!(
            "SELECT {} FROM canteen_items ORDER BY name ASC",
            ITEM_COLUMNS
        ))
        .fetch_all(&state.db)
        .await?
    } else {
        sqlx::query_as::<_, CanteenItem>(&format!(
            "SELECT {} FROM canteen_items WHERE active = TRUE ORDER BY name ASC",
            ITEM_COLUMNS
        ))
        .fetch_all(&state.db)
        .await?
    };

    let total = data.len() as i64;
    Ok(Json(ItemListResponse { data, total }))
}

/// Cadastra um item do cardápio (admin)
#[utoipa::path(
    post,
    path = "/api/items",
    tag = "Items",
    security(("bearer_auth" = [])),
    request_body = CreateItemRequest,
    responses(
        (status = 201, description = "Item criado", body = CanteenItem),
        (status = 403, description = "Apenas admins"),
        (status = 422, description = "Dados inválidos")
    )
)]
pub async fn create_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateItemRequest>,
) -> AppResult<(StatusCode, Json<CanteenItem>)> {
    if !auth.is_admin() {
        return Err(AppError::forbidden("Apenas admins alteram o cardápio"));
    }

    body.validate().map_err(AppError::validation)?;

    let item = sqlx::query_as::<_, CanteenItem>(&format!(
        "INSERT INTO canteen_items (name, unit_price, active) VALUES ($1, $2, TRUE) \
         RETURNING {}",
        ITEM_COLUMNS
    ))
    .bind(body.name.trim())
    .bind(body.unit_price)
    .fetch_one(&state.db)
    .await?;

    tracing::info!("Item criado - {} (R$ {:.2})", item.name, item.unit_price);

    Ok((StatusCode::CREATED, Json(item)))
}

/// Atualiza nome, preço ou disponibilidade de um item (admin). O preço novo
/// vale só para consumos futuros; os registros antigos guardam o preço da
/// época.
#[utoipa::path(
    put,
    path = "/api/items/{id}",
    tag = "Items",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "ID do item")),
    request_body = UpdateItemRequest,
    responses(
        (status = 200, description = "Item atualizado", body = CanteenItem),
        (status = 403, description = "Apenas admins"),
        (status = 404, description = "Item não encontrado")
    )
)]
pub async fn update_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(item_id): Path<i32>,
    Json(body): Json<UpdateItemRequest>,
) -> AppResult<Json<CanteenItem>> {
    if !auth.is_admin() {
        return Err(AppError::forbidden("Apenas admins alteram o cardápio"));
    }

    body.validate().map_err(AppError::validation)?;

    let item = sqlx::query_as::<_, CanteenItem>(&format!(
        "UPDATE canteen_items SET \
             name = COALESCE($2, name), \
             unit_price = COALESCE($3, unit_price), \
             active = COALESCE($4, active) \
         WHERE id = $1 \
         RETURNING {}",
        ITEM_COLUMNS
    ))
    .bind(item_id)
    .bind(body.name.as_deref().map(str::trim))
    .bind(body.unit_price)
    .bind(body.active)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::not_found("Item não encontrado"))?;

    tracing::info!("Item {} atualizado pelo admin {}", item_id, auth.user_id);

    Ok(Json(item))
}
