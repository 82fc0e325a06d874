// src/handlers/codes.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError, config::AppState, middleware::tenancy::TenantContext,
};

// ---
// Payload: carga em massa de códigos pré-gerados para um produto.
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadCodesPayload {
    #[validate(length(min = 1, message = "Informe ao menos um código."))]
    #[schema(example = json!(["AAAA-BBBB-CCCC", "DDDD-EEEE-FFFF"]))]
    pub codes: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CodeStockResponse {
    pub product_id: Uuid,
    #[schema(example = 42)]
    pub available: i64,
}

// POST /api/products/{id}/codes
#[utoipa::path(
    post,
    path = "/api/products/{id}/codes",
    tag = "Códigos de Ativação",
    request_body = UploadCodesPayload,
    responses(
        (status = 201, description = "Códigos adicionados ao estoque do produto", body = CodeStockResponse),
        (status = 404, description = "Produto não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do produto"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    )
)]
pub async fn upload_codes(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<UploadCodesPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    // Garante que o produto existe e pertence à loja antes de aceitar códigos.
    let product = app_state.catalog_service.get_product(tenant.0, id).await?;

    let codes: Vec<String> = payload
        .codes
        .iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();

    let inserted = app_state
        .code_repo
        .bulk_insert(&app_state.db_pool, product.id, &codes)
        .await?;
    tracing::info!(
        "Produto {}: {} código(s) adicionados ao estoque",
        product.id,
        inserted
    );

    let available = app_state
        .code_repo
        .count_available(&app_state.db_pool, product.id)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(CodeStockResponse {
            product_id: product.id,
            available,
        }),
    ))
}

// GET /api/products/{id}/codes/available
#[utoipa::path(
    get,
    path = "/api/products/{id}/codes/available",
    tag = "Códigos de Ativação",
    responses(
        (status = 200, description = "Quantidade de códigos livres do produto", body = CodeStockResponse),
        (status = 404, description = "Produto não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do produto"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    )
)]
pub async fn available_codes(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let product = app_state.catalog_service.get_product(tenant.0, id).await?;
    let available = app_state
        .code_repo
        .count_available(&app_state.db_pool, product.id)
        .await?;
    Ok((
        StatusCode::OK,
        Json(CodeStockResponse {
            product_id: product.id,
            available,
        }),
    ))
}
