// src/db/order_repo.rs

use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::order::{MarketOrder, OrderStatus},
};

#[derive(Clone)]
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Leituras
    // ---

    pub async fn list<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<MarketOrder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let orders = sqlx::query_as::<_, MarketOrder>(
            r#"
            SELECT * FROM market_orders
            WHERE tenant_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(tenant_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await?;
        Ok(orders)
    }

    /// Todos os registros locais que compartilham um pedido remoto.
    pub async fn find_group<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        remote_order_id: &str,
    ) -> Result<Vec<MarketOrder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let orders = sqlx::query_as::<_, MarketOrder>(
            r#"
            SELECT * FROM market_orders
            WHERE tenant_id = $1 AND remote_order_id = $2
            ORDER BY created_at ASC
            "#,
        )
        .bind(tenant_id)
        .bind(remote_order_id)
        .fetch_all(executor)
        .await?;
        Ok(orders)
    }

    pub async fn find_by_remote_and_product<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        remote_order_id: &str,
        product_id: Uuid,
    ) -> Result<Option<MarketOrder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, MarketOrder>(
            r#"
            SELECT * FROM market_orders
            WHERE tenant_id = $1 AND remote_order_id = $2 AND product_id = $3
            "#,
        )
        .bind(tenant_id)
        .bind(remote_order_id)
        .bind(product_id)
        .fetch_optional(executor)
        .await?;
        Ok(order)
    }

    // ---
    // Escritas
    // ---

    /// Tenta criar o registro do item. `Ok(None)` sinaliza corrida perdida:
    /// outro passe de sync inseriu primeiro e o chamador deve cair no update.
    #[allow(clippy::too_many_arguments)]
    pub async fn try_insert<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        remote_order_id: &str,
        product_id: Uuid,
        quantity: i32,
        amount: Decimal,
        status: OrderStatus,
        remote_status: &str,
        snapshot: &Value,
    ) -> Result<Option<MarketOrder>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query_as::<_, MarketOrder>(
            r#"
            INSERT INTO market_orders
                (tenant_id, remote_order_id, product_id, quantity, amount, status, remote_status, snapshot)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(remote_order_id)
        .bind(product_id)
        .bind(quantity)
        .bind(amount)
        .bind(status)
        .bind(remote_status)
        .bind(snapshot)
        .fetch_one(executor)
        .await;

        match result {
            Ok(order) => Ok(Some(order)),
            Err(e) => {
                if let Some(db_err) = e.as_database_error() {
                    if db_err.is_unique_violation() {
                        return Ok(None);
                    }
                }
                Err(e.into())
            }
        }
    }

    /// Refresh do sync: quantidade, valor, snapshot e status bruto sempre;
    /// o status local já chega aqui filtrado pela guarda de transição.
    #[allow(clippy::too_many_arguments)]
    pub async fn update_sync_fields<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        quantity: i32,
        amount: Decimal,
        status: OrderStatus,
        remote_status: &str,
        snapshot: &Value,
    ) -> Result<MarketOrder, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, MarketOrder>(
            r#"
            UPDATE market_orders
            SET quantity = $2,
                amount = $3,
                status = $4,
                remote_status = $5,
                snapshot = $6,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(quantity)
        .bind(amount)
        .bind(status)
        .bind(remote_status)
        .bind(snapshot)
        .fetch_one(executor)
        .await?;
        Ok(order)
    }

    /// Promove os irmãos não finalizados para `Completed`, carimbando
    /// completed_at apenas se ainda não tiver sido carimbado.
    pub async fn promote_group_completed<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        remote_order_id: &str,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE market_orders
            SET status = 'COMPLETED',
                completed_at = COALESCE(completed_at, NOW()),
                updated_at = NOW()
            WHERE tenant_id = $1
              AND remote_order_id = $2
              AND status <> 'FINISHED'
            "#,
        )
        .bind(tenant_id)
        .bind(remote_order_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// Ação manual: finaliza todos os irmãos não cancelados do pedido.
    pub async fn mark_group_finished<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        remote_order_id: &str,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE market_orders
            SET status = 'FINISHED',
                completed_at = COALESCE(completed_at, NOW()),
                updated_at = NOW()
            WHERE tenant_id = $1
              AND remote_order_id = $2
              AND status <> 'CANCELLED'
            "#,
        )
        .bind(tenant_id)
        .bind(remote_order_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn bind_code<'e, E>(
        &self,
        executor: E,
        order_id: Uuid,
        code_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            "UPDATE market_orders SET activation_code_id = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(order_id)
        .bind(code_id)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Marca o registro como enviado. O `WHERE sent = FALSE` é a trava de
    /// idempotência contra dois fulfillments concorrentes do mesmo pedido.
    pub async fn mark_sent<'e, E>(&self, executor: E, order_id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE market_orders
            SET sent = TRUE,
                sent_at = NOW(),
                completed_at = COALESCE(completed_at, NOW()),
                updated_at = NOW()
            WHERE id = $1 AND sent = FALSE
            "#,
        )
        .bind(order_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
