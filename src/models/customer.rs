// src/models/customer.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// Histórico de compras por comprador do marketplace.
// Alimentado pelo reconciliador: incrementa em pedido concluído,
// desfaz em cancelamento observado.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    #[schema(example = "90210")]
    pub market_buyer_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[schema(example = 3)]
    pub orders_count: i32,
    #[schema(example = "899.70")]
    pub total_spent: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
