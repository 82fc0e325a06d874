// src/db/code_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::code::ActivationCode};

#[derive(Clone)]
pub struct CodeRepository {
    pool: PgPool,
}

impl CodeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<ActivationCode>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let code = sqlx::query_as::<_, ActivationCode>(
            "SELECT * FROM activation_codes WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(code)
    }

    pub async fn count_available<'e, E>(
        &self,
        executor: E,
        product_id: Uuid,
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM activation_codes WHERE product_id = $1 AND used = FALSE",
        )
        .bind(product_id)
        .fetch_one(executor)
        .await?;
        Ok(count.0)
    }

    /// Pré-geração em massa: insere um lote de códigos livres para o produto.
    pub async fn bulk_insert<'e, E>(
        &self,
        executor: E,
        product_id: Uuid,
        codes: &[String],
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            INSERT INTO activation_codes (product_id, code)
            SELECT $1, unnest($2::text[])
            "#,
        )
        .bind(product_id)
        .bind(codes)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// Consome atomicamente o código livre mais antigo do produto.
    /// `FOR UPDATE SKIP LOCKED` evita que dois fulfillments concorrentes
    /// levem o mesmo código.
    pub async fn claim_oldest_unused<'e, E>(
        &self,
        executor: E,
        product_id: Uuid,
        order_id: Uuid,
    ) -> Result<Option<ActivationCode>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let code = sqlx::query_as::<_, ActivationCode>(
            r#"
            UPDATE activation_codes
            SET used = TRUE, used_at = NOW(), order_id = $2
            WHERE id = (
                SELECT id FROM activation_codes
                WHERE product_id = $1 AND used = FALSE
                ORDER BY created_at ASC
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            )
            RETURNING *
            "#,
        )
        .bind(product_id)
        .bind(order_id)
        .fetch_optional(executor)
        .await?;
        Ok(code)
    }

    /// Registra um código já consumido: valor manual informado pelo operador
    /// ou código recém-gerado para template de geração automática.
    pub async fn insert_used<'e, E>(
        &self,
        executor: E,
        product_id: Uuid,
        code: &str,
        order_id: Uuid,
    ) -> Result<ActivationCode, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let code = sqlx::query_as::<_, ActivationCode>(
            r#"
            INSERT INTO activation_codes (product_id, code, used, used_at, order_id)
            VALUES ($1, $2, TRUE, NOW(), $3)
            RETURNING *
            "#,
        )
        .bind(product_id)
        .bind(code)
        .bind(order_id)
        .fetch_one(executor)
        .await?;
        Ok(code)
    }
}
