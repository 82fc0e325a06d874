// src/handlers/customers.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use uuid::Uuid;

use crate::{
    common::error::AppError, config::AppState, middleware::tenancy::TenantContext,
    models::customer::Customer,
};

// GET /api/customers
#[utoipa::path(
    get,
    path = "/api/customers",
    tag = "Clientes",
    responses(
        (status = 200, description = "Histórico de compras por comprador", body = Vec<Customer>)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    )
)]
pub async fn list_customers(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let customers = app_state.customer_service.list_customers(tenant.0).await?;
    Ok((StatusCode::OK, Json(customers)))
}
