// src/handlers/templates.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError, config::AppState, middleware::tenancy::TenantContext,
    models::template::FulfillmentTemplate,
};

// GET /api/templates
#[utoipa::path(
    get,
    path = "/api/templates",
    tag = "Templates",
    responses(
        (status = 200, description = "Templates de entrega da loja", body = Vec<FulfillmentTemplate>)
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    )
)]
pub async fn list_templates(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let templates = app_state
        .template_repo
        .get_all(&app_state.db_pool, tenant.0)
        .await?;
    Ok((StatusCode::OK, Json(templates)))
}

// ---
// Payload: criação de template. O corpo aceita os placeholders
// {processing_time}, {contact_email} e {validity_days}.
// ---
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTemplatePayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    #[schema(example = "Entrega padrão de gift card")]
    pub name: String,

    #[validate(length(min = 1, message = "O corpo do template é obrigatório."))]
    #[schema(example = "Ative em até {processing_time}. Dúvidas: {contact_email}")]
    pub body: String,

    // false = os códigos chegam por fora, na ativação manual
    #[serde(default = "default_auto_generated")]
    pub auto_generated: bool,

    #[validate(range(min = 1, message = "A validade mínima é de 1 dia."))]
    #[serde(default = "default_validity_days")]
    #[schema(example = 30)]
    pub validity_days: i32,
}

fn default_auto_generated() -> bool {
    true
}

fn default_validity_days() -> i32 {
    30
}

// POST /api/templates
#[utoipa::path(
    post,
    path = "/api/templates",
    tag = "Templates",
    request_body = CreateTemplatePayload,
    responses(
        (status = 201, description = "Template criado", body = FulfillmentTemplate),
        (status = 400, description = "Payload inválido")
    ),
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    )
)]
pub async fn create_template(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Json(payload): Json<CreateTemplatePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let template = app_state
        .template_repo
        .create(
            &app_state.db_pool,
            tenant.0,
            &payload.name,
            &payload.body,
            payload.auto_generated,
            payload.validity_days,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(template)))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTemplatePayload {
    #[validate(length(min = 1, message = "O nome não pode ficar vazio."))]
    pub name: Option<String>,

    #[validate(length(min = 1, message = "O corpo não pode ficar vazio."))]
    pub body: Option<String>,

    pub auto_generated: Option<bool>,

    #[validate(range(min = 1, message = "A validade mínima é de 1 dia."))]
    pub validity_days: Option<i32>,
}

// PATCH /api/templates/{id}
#[utoipa::path(
    patch,
    path = "/api/templates/{id}",
    tag = "Templates",
    request_body = UpdateTemplatePayload,
    responses(
        (status = 200, description = "Template atualizado", body = FulfillmentTemplate),
        (status = 404, description = "Template não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do template"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    )
)]
pub async fn update_template(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTemplatePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let template = app_state
        .template_repo
        .update(
            &app_state.db_pool,
            tenant.0,
            id,
            payload.name.as_deref(),
            payload.body.as_deref(),
            payload.auto_generated,
            payload.validity_days,
        )
        .await?;
    Ok((StatusCode::OK, Json(template)))
}
