// src/services/customer_service.rs
//
// Colaborador de histórico de compras. O reconciliador avisa "concluiu" /
// "cancelou" e segue em frente; falha aqui nunca derruba a unidade de
// reconciliação do pedido.

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::CustomerRepository,
    models::customer::Customer,
    services::order_service::UpsertOutcome,
};

#[derive(Clone)]
pub struct CustomerService {
    customer_repo: CustomerRepository,
    pool: PgPool,
}

impl CustomerService {
    pub fn new(customer_repo: CustomerRepository, pool: PgPool) -> Self {
        Self { customer_repo, pool }
    }

    pub async fn list_customers(&self, tenant_id: Uuid) -> Result<Vec<Customer>, AppError> {
        self.customer_repo.get_all(&self.pool, tenant_id).await
    }

    /// Soma o pedido concluído ao histórico do comprador.
    pub async fn record_completed_order(
        &self,
        tenant_id: Uuid,
        outcome: &UpsertOutcome,
    ) -> Result<(), AppError> {
        let Some(buyer) = outcome.buyer.as_ref() else {
            return Ok(());
        };
        let Some(buyer_id) = buyer.id.as_deref() else {
            return Ok(());
        };
        self.customer_repo
            .record_purchase(
                &self.pool,
                tenant_id,
                buyer_id,
                buyer.first_name.as_deref(),
                buyer.last_name.as_deref(),
                outcome.total_amount,
            )
            .await?;
        Ok(())
    }

    /// Desfaz as quantidades quando um cancelamento é observado.
    pub async fn rollback_cancelled_order(
        &self,
        tenant_id: Uuid,
        outcome: &UpsertOutcome,
    ) -> Result<(), AppError> {
        let buyer_id = outcome
            .buyer
            .as_ref()
            .and_then(|b| b.id.clone())
            .or_else(|| outcome.records.iter().find_map(|r| r.buyer_id()));
        let Some(buyer_id) = buyer_id else {
            return Ok(());
        };
        self.customer_repo
            .rollback_purchase(&self.pool, tenant_id, &buyer_id, outcome.total_amount)
            .await?;
        Ok(())
    }
}
