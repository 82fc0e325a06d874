// src/handlers/products.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::AppError, config::AppState, middleware::tenancy::TenantContext,
    models::product::{Product, ProductType},
};

// GET /api/products
#[utoipa::path(
    get,
    path = "/api/products",
    tag = "Catálogo",
    responses(
        (status = 200, description = "Lista de produtos da loja", body = Vec<Product>)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    )
)]
pub async fn list_products(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let products = app_state.catalog_service.list_products(tenant.0).await?;
    Ok((StatusCode::OK, Json(products)))
}

// GET /api/products/{id}
#[utoipa::path(
    get,
    path = "/api/products/{id}",
    tag = "Catálogo",
    responses(
        (status = 200, description = "Produto", body = Product),
        (status = 404, description = "Produto não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do produto"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    )
)]
pub async fn get_product(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let product = app_state.catalog_service.get_product(tenant.0, id).await?;
    Ok((StatusCode::OK, Json(product)))
}

// ---
// Payload: edições locais do produto.
// Campos remotos (nome, snapshot, chaves) só mudam pelo sync de catálogo.
// ---
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductPayload {
    #[schema(example = "DIGITAL")]
    pub product_type: Option<ProductType>,

    pub template_id: Option<Uuid>,

    #[schema(example = "65.00")]
    pub purchase_cost: Option<Decimal>,

    #[schema(example = "Fornecedor XYZ")]
    pub supplier: Option<String>,

    pub active: Option<bool>,
}

// PATCH /api/products/{id}
#[utoipa::path(
    patch,
    path = "/api/products/{id}",
    tag = "Catálogo",
    request_body = UpdateProductPayload,
    responses(
        (status = 200, description = "Produto atualizado", body = Product),
        (status = 404, description = "Produto não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do produto"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    )
)]
pub async fn update_product(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductPayload>,
) -> Result<impl IntoResponse, AppError> {
    let product = app_state
        .catalog_service
        .update_product(
            tenant.0,
            id,
            payload.product_type,
            payload.template_id,
            payload.purchase_cost,
            payload.supplier.as_deref(),
            payload.active,
        )
        .await?;
    Ok((StatusCode::OK, Json(product)))
}
