// src/db/template_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::template::FulfillmentTemplate};

#[derive(Clone)]
pub struct TemplateRepository {
    pool: PgPool,
}

impl TemplateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_all<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
    ) -> Result<Vec<FulfillmentTemplate>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let templates = sqlx::query_as::<_, FulfillmentTemplate>(
            "SELECT * FROM fulfillment_templates WHERE tenant_id = $1 ORDER BY name ASC",
        )
        .bind(tenant_id)
        .fetch_all(executor)
        .await?;
        Ok(templates)
    }

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<FulfillmentTemplate>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let template = sqlx::query_as::<_, FulfillmentTemplate>(
            "SELECT * FROM fulfillment_templates WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(template)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        name: &str,
        body: &str,
        auto_generated: bool,
        validity_days: i32,
    ) -> Result<FulfillmentTemplate, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let template = sqlx::query_as::<_, FulfillmentTemplate>(
            r#"
            INSERT INTO fulfillment_templates (tenant_id, name, body, auto_generated, validity_days)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(name)
        .bind(body)
        .bind(auto_generated)
        .bind(validity_days)
        .fetch_one(executor)
        .await?;
        Ok(template)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        name: Option<&str>,
        body: Option<&str>,
        auto_generated: Option<bool>,
        validity_days: Option<i32>,
    ) -> Result<FulfillmentTemplate, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let template = sqlx::query_as::<_, FulfillmentTemplate>(
            r#"
            UPDATE fulfillment_templates
            SET name = COALESCE($3, name),
                body = COALESCE($4, body),
                auto_generated = COALESCE($5, auto_generated),
                validity_days = COALESCE($6, validity_days),
                updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(name)
        .bind(body)
        .bind(auto_generated)
        .bind(validity_days)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::TemplateNotFound)?;
        Ok(template)
    }
}
