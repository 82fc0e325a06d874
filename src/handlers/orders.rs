// src/handlers/orders.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::collections::HashMap;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::tenancy::TenantContext,
    models::order::MarketOrder,
    services::fulfillment_service::FulfillmentReport,
};

#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

// GET /api/orders
#[utoipa::path(
    get,
    path = "/api/orders",
    tag = "Pedidos",
    responses(
        (status = 200, description = "Registros de pedidos da loja", body = Vec<MarketOrder>)
    ),
    params(
        ("limit" = Option<i64>, Query, description = "Máximo de registros (default 50)"),
        ("offset" = Option<i64>, Query, description = "Deslocamento"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    )
)]
pub async fn list_orders(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<ListOrdersQuery>,
) -> Result<impl IntoResponse, AppError> {
    let orders = app_state
        .order_service
        .list_orders(tenant.0, query.limit.clamp(1, 500), query.offset.max(0))
        .await?;
    Ok((StatusCode::OK, Json(orders)))
}

// GET /api/orders/{remote_order_id}
#[utoipa::path(
    get,
    path = "/api/orders/{remote_order_id}",
    tag = "Pedidos",
    responses(
        (status = 200, description = "Grupo de registros do pedido remoto", body = Vec<MarketOrder>),
        (status = 404, description = "Pedido não encontrado")
    ),
    params(
        ("remote_order_id" = String, Path, description = "ID do pedido no marketplace"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    )
)]
pub async fn get_order_group(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(remote_order_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let group = app_state
        .order_service
        .get_group(tenant.0, &remote_order_id)
        .await?;
    Ok((StatusCode::OK, Json(group)))
}

// ---
// Payload: ativação manual. Para produto de chave manual, o operador manda
// o código aqui, chaveado pelo id do produto.
// ---
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompleteOrderPayload {
    #[serde(default)]
    pub manual_codes: HashMap<Uuid, String>,
}

// POST /api/orders/{remote_order_id}/complete
#[utoipa::path(
    post,
    path = "/api/orders/{remote_order_id}/complete",
    tag = "Pedidos",
    request_body = CompleteOrderPayload,
    responses(
        (status = 200, description = "Códigos entregues ao marketplace", body = FulfillmentReport),
        (status = 409, description = "Pedido já enviado"),
        (status = 422, description = "Produtos sem template ou sem itens entregáveis")
    ),
    params(
        ("remote_order_id" = String, Path, description = "ID do pedido no marketplace"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    )
)]
pub async fn complete_order(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(remote_order_id): Path<String>,
    payload: Option<Json<CompleteOrderPayload>>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload.unwrap_or_default();
    let report = app_state
        .fulfillment_service
        .complete(tenant.0, &remote_order_id, &payload.manual_codes)
        .await?;
    Ok((StatusCode::OK, Json(report)))
}

// POST /api/orders/{remote_order_id}/finish
#[utoipa::path(
    post,
    path = "/api/orders/{remote_order_id}/finish",
    tag = "Pedidos",
    responses(
        (status = 200, description = "Pedido finalizado manualmente", body = Vec<MarketOrder>),
        (status = 404, description = "Pedido não encontrado")
    ),
    params(
        ("remote_order_id" = String, Path, description = "ID do pedido no marketplace"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    )
)]
pub async fn finish_order(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(remote_order_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let group = app_state
        .order_service
        .mark_finished(tenant.0, &remote_order_id)
        .await?;
    Ok((StatusCode::OK, Json(group)))
}
