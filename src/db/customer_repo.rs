// src/db/customer_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::customer::Customer};

#[derive(Clone)]
pub struct CustomerRepository {
    pool: PgPool,
}

impl CustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_all<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
    ) -> Result<Vec<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customers = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE tenant_id = $1 ORDER BY updated_at DESC",
        )
        .bind(tenant_id)
        .fetch_all(executor)
        .await?;
        Ok(customers)
    }

    /// Soma uma compra ao histórico do comprador, criando a linha na primeira vez.
    #[allow(clippy::too_many_arguments)]
    pub async fn record_purchase<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        market_buyer_id: &str,
        first_name: Option<&str>,
        last_name: Option<&str>,
        amount: Decimal,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (tenant_id, market_buyer_id, first_name, last_name, orders_count, total_spent)
            VALUES ($1, $2, $3, $4, 1, $5)
            ON CONFLICT (tenant_id, market_buyer_id)
            DO UPDATE SET
                orders_count = customers.orders_count + 1,
                total_spent = customers.total_spent + $5,
                first_name = COALESCE(EXCLUDED.first_name, customers.first_name),
                last_name = COALESCE(EXCLUDED.last_name, customers.last_name),
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(market_buyer_id)
        .bind(first_name)
        .bind(last_name)
        .bind(amount)
        .fetch_one(executor)
        .await?;
        Ok(customer)
    }

    /// Desfaz uma compra quando o cancelamento é observado depois da conclusão.
    /// Contadores nunca ficam negativos.
    pub async fn rollback_purchase<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        market_buyer_id: &str,
        amount: Decimal,
    ) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers
            SET orders_count = GREATEST(orders_count - 1, 0),
                total_spent = GREATEST(total_spent - $3, 0),
                updated_at = NOW()
            WHERE tenant_id = $1 AND market_buyer_id = $2
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(market_buyer_id)
        .bind(amount)
        .fetch_optional(executor)
        .await?;
        Ok(customer)
    }
}
