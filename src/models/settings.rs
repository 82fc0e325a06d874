// src/models/settings.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TenantSettings {
    #[schema(ignore)] // O contexto (Header) já define a loja
    pub tenant_id: Uuid,

    #[schema(example = "21459840")]
    pub campaign_id: Option<String>,

    // Token da API do marketplace; nunca aparece em respostas de listagem.
    #[schema(ignore)]
    pub api_token: Option<String>,

    #[schema(example = true)]
    pub auto_activation_enabled: bool,

    #[schema(example = true)]
    pub sync_enabled: bool,

    #[schema(example = "até 24 horas úteis")]
    pub processing_time_text: Option<String>,

    #[schema(example = "contato@minhaloja.com")]
    pub contact_email: Option<String>,

    pub updated_at: Option<DateTime<Utc>>,
}

impl TenantSettings {
    /// Configuração vazia para lojas que ainda não salvaram nada.
    pub fn empty(tenant_id: Uuid) -> Self {
        TenantSettings {
            tenant_id,
            campaign_id: None,
            api_token: None,
            auto_activation_enabled: false,
            sync_enabled: false,
            processing_time_text: None,
            contact_email: None,
            updated_at: None,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    #[schema(example = "21459840")]
    pub campaign_id: Option<String>,

    pub api_token: Option<String>,

    #[schema(example = true)]
    pub auto_activation_enabled: Option<bool>,

    #[schema(example = true)]
    pub sync_enabled: Option<bool>,

    #[schema(example = "até 24 horas úteis")]
    pub processing_time_text: Option<String>,

    #[schema(example = "contato@minhaloja.com")]
    pub contact_email: Option<String>,
}
