// src/handlers/sync.rs
//
// Os dois caminhos de ingresso de pedidos (webhook do marketplace e
// disparo manual do passe completo) desembocam no mesmo ponto de entrada
// do SyncService, com semântica idêntica à do poll periódico.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::tenancy::TenantContext,
    models::market::RemoteOrder,
    models::order::{MarketOrder, OrderStatus},
    services::sync_service::ReconcileSummary,
};

// POST /api/sync
#[utoipa::path(
    post,
    path = "/api/sync",
    tag = "Sincronização",
    responses(
        (status = 200, description = "Passe completo de reconciliação executado", body = ReconcileSummary),
        (status = 422, description = "Loja sem credenciais do marketplace configuradas")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    )
)]
pub async fn trigger_sync(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let summary = app_state.sync_service.reconcile_by_tenant_id(tenant.0).await?;
    Ok((StatusCode::OK, Json(summary)))
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    #[schema(example = "33510846-1")]
    pub remote_order_id: String,
    pub status: OrderStatus,
    pub records: Vec<MarketOrder>,
    #[schema(example = 1)]
    pub skipped_items: usize,
    pub auto_fulfilled: bool,
}

// POST /api/market/webhook
#[utoipa::path(
    post,
    path = "/api/market/webhook",
    tag = "Sincronização",
    request_body = Value,
    responses(
        (status = 200, description = "Pedido remoto processado", body = WebhookResponse),
        (status = 400, description = "Payload de pedido inválido")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    )
)]
pub async fn market_webhook(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    // Notificações embrulham o pedido em "order"; o poll manda o objeto puro.
    let raw = payload.get("order").cloned().unwrap_or(payload);
    let remote = RemoteOrder::from_value(raw)
        .map_err(|e| AppError::MarketRejected(format!("payload de pedido inválido: {e}")))?;

    tracing::info!("Webhook: pedido {} recebido do marketplace", remote.id);
    let (outcome, auto_fulfilled) = app_state
        .sync_service
        .process_and_auto_fulfill(tenant.0, &remote)
        .await?;

    Ok((
        StatusCode::OK,
        Json(WebhookResponse {
            remote_order_id: outcome.remote_order_id,
            status: outcome.mapped_status,
            records: outcome.records,
            skipped_items: outcome.skipped_items,
            auto_fulfilled,
        }),
    ))
}
