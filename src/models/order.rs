// src/models/order.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Status local do pedido ---
// O marketplace manda dezenas de strings de status; aqui só existem seis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "order_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Processing,
    Completed,
    Finished,
    Cancelled,
    Failed,
}

impl OrderStatus {
    /// Traduz o status bruto do marketplace para o status local.
    /// Tabela fixa: string desconhecida nunca é erro, vira `Pending`.
    pub fn from_remote(raw: &str) -> Self {
        match raw {
            "PROCESSING" | "DELIVERY" | "PICKUP" => OrderStatus::Processing,
            "DELIVERED" => OrderStatus::Completed,
            "CANCELLED"
            | "CANCELLED_BEFORE_PROCESSING"
            | "CANCELLED_IN_PROCESSING"
            | "CANCELLED_IN_DELIVERY"
            | "RETURNED"
            | "UNDELIVERED" => OrderStatus::Cancelled,
            other if other.starts_with("CANCELLED") => OrderStatus::Cancelled,
            // UNPAID, RESERVED, PENDING, vazio ou qualquer coisa nova
            _ => OrderStatus::Pending,
        }
    }

    /// Guarda de transição: um pedido finalizado manualmente só sai de
    /// `Finished` por cancelamento. Qualquer outro status mapeado é descartado.
    pub fn apply_remote(current: Self, mapped: Self) -> Self {
        if current == OrderStatus::Finished && mapped != OrderStatus::Cancelled {
            return OrderStatus::Finished;
        }
        mapped
    }
}

// --- Registro local de pedido ---
// Um registro por item casado do pedido remoto: (remote_order_id, product_id) é único.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarketOrder {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    #[schema(example = "33510846-1")]
    pub remote_order_id: String,
    pub product_id: Uuid,
    #[schema(example = 1)]
    pub quantity: i32,
    #[schema(example = "299.90")]
    pub amount: Decimal,
    pub status: OrderStatus,
    #[schema(example = "DELIVERY")]
    pub remote_status: String,
    // Payload completo do pedido remoto, relido a cada passagem de fulfillment.
    #[schema(ignore)]
    pub snapshot: Option<Value>,
    pub activation_code_id: Option<Uuid>,
    pub sent: bool,
    pub sent_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MarketOrder {
    /// Acessor estreito sobre o snapshot: o id do comprador, se presente.
    pub fn buyer_id(&self) -> Option<String> {
        self.snapshot
            .as_ref()
            .and_then(|s| s.get("buyer"))
            .and_then(|b| b.get("id"))
            .map(crate::models::market::json_value_to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapeia_status_remotos_conhecidos() {
        let casos = [
            ("PROCESSING", OrderStatus::Processing),
            ("DELIVERY", OrderStatus::Processing),
            ("PICKUP", OrderStatus::Processing),
            ("DELIVERED", OrderStatus::Completed),
            ("CANCELLED", OrderStatus::Cancelled),
            ("CANCELLED_IN_DELIVERY", OrderStatus::Cancelled),
            ("CANCELLED_BY_SHOP", OrderStatus::Cancelled),
            ("RETURNED", OrderStatus::Cancelled),
            ("UNPAID", OrderStatus::Pending),
            ("RESERVED", OrderStatus::Pending),
            ("PENDING", OrderStatus::Pending),
            ("", OrderStatus::Pending),
            ("ALGO_NOVO_DA_API", OrderStatus::Pending),
        ];
        for (bruto, esperado) in casos {
            assert_eq!(OrderStatus::from_remote(bruto), esperado, "status {bruto:?}");
        }
    }

    #[test]
    fn finished_so_cede_para_cancelled() {
        for mapeado in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Completed,
            OrderStatus::Failed,
        ] {
            assert_eq!(
                OrderStatus::apply_remote(OrderStatus::Finished, mapeado),
                OrderStatus::Finished
            );
        }
        assert_eq!(
            OrderStatus::apply_remote(OrderStatus::Finished, OrderStatus::Cancelled),
            OrderStatus::Cancelled
        );
    }

    #[test]
    fn demais_status_seguem_o_mapeado() {
        assert_eq!(
            OrderStatus::apply_remote(OrderStatus::Pending, OrderStatus::Processing),
            OrderStatus::Processing
        );
        assert_eq!(
            OrderStatus::apply_remote(OrderStatus::Completed, OrderStatus::Cancelled),
            OrderStatus::Cancelled
        );
    }
}
