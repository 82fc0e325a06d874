// src/models/product.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "product_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductType {
    Digital,
    Physical,
}

// Entrada do catálogo local, espelhada do marketplace.
// Campos remotos são atualizados pelo sync; custo, fornecedor e template
// são edições locais que o sync nunca sobrescreve.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    #[schema(example = "Gift Card 100")]
    pub name: String,
    pub product_type: ProductType,
    #[schema(example = "GC-100")]
    pub external_id: Option<String>,
    #[schema(example = "gc.100.ru")]
    pub external_sku: Option<String>,
    // Card completo da oferta remota; fallback de casamento e cache de exibição.
    #[schema(ignore)]
    pub snapshot: Option<Value>,
    pub template_id: Option<Uuid>,
    #[schema(example = "65.00")]
    pub purchase_cost: Option<Decimal>,
    pub supplier: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn is_digital(&self) -> bool {
        self.product_type == ProductType::Digital
    }
}
