// src/middleware/tenancy.rs

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::common::error::AppError;

// O nome do nosso cabeçalho HTTP customizado
const TENANT_ID_HEADER: &str = "x-tenant-id";

// O extrator de loja: todo endpoint do catálogo/pedidos é escopado por ele.
#[derive(Debug, Clone)]
pub struct TenantContext(pub Uuid);

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header_value = parts.headers.get(TENANT_ID_HEADER);

        match header_value {
            Some(value) => {
                let value_str = value.to_str().map_err(|_| {
                    AppError::BadTenantHeader(
                        "Cabeçalho X-Tenant-ID contém caracteres inválidos.".to_string(),
                    )
                })?;

                let tenant_id = Uuid::parse_str(value_str).map_err(|_| {
                    AppError::BadTenantHeader(
                        "Cabeçalho X-Tenant-ID inválido (não é um UUID).".to_string(),
                    )
                })?;

                Ok(TenantContext(tenant_id))
            }
            None => Err(AppError::BadTenantHeader(
                "O cabeçalho X-Tenant-ID é obrigatório.".to_string(),
            )),
        }
    }
}
