// src/models/code.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// Código de ativação de uso único. Ciclo de vida: Unused -> Used, sem volta.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivationCode {
    pub id: Uuid,
    pub product_id: Uuid,
    #[schema(example = "XXXX-YYYY-ZZZZ")]
    pub code: String,
    pub used: bool,
    pub used_at: Option<DateTime<Utc>>,
    // Pedido que consumiu o código, quando consumido via fulfillment.
    pub order_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}
