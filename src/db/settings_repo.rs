// src/db/settings_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::settings::{TenantSettings, UpdateSettingsRequest},
};

#[derive(Clone)]
pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Leitura sempre fresca; loja sem linha salva recebe o default vazio.
    pub async fn get_settings<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
    ) -> Result<TenantSettings, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let settings = sqlx::query_as::<_, TenantSettings>(
            "SELECT * FROM tenant_settings WHERE tenant_id = $1",
        )
        .bind(tenant_id)
        .fetch_optional(executor)
        .await?;

        Ok(settings.unwrap_or_else(|| TenantSettings::empty(tenant_id)))
    }

    /// Lojas habilitadas para o passe periódico de reconciliação.
    pub async fn list_sync_enabled<'e, E>(
        &self,
        executor: E,
    ) -> Result<Vec<TenantSettings>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let settings = sqlx::query_as::<_, TenantSettings>(
            "SELECT * FROM tenant_settings WHERE sync_enabled = TRUE",
        )
        .fetch_all(executor)
        .await?;
        Ok(settings)
    }

    pub async fn update_settings<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        input: UpdateSettingsRequest,
    ) -> Result<TenantSettings, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // UPSERT (Insert or Update); campos omitidos mantêm o valor atual.
        let settings = sqlx::query_as::<_, TenantSettings>(
            r#"
            INSERT INTO tenant_settings
                (tenant_id, campaign_id, api_token, auto_activation_enabled, sync_enabled,
                 processing_time_text, contact_email, updated_at)
            VALUES ($1, $2, $3, COALESCE($4, FALSE), COALESCE($5, FALSE), $6, $7, NOW())
            ON CONFLICT (tenant_id)
            DO UPDATE SET
                campaign_id = COALESCE(EXCLUDED.campaign_id, tenant_settings.campaign_id),
                api_token = COALESCE(EXCLUDED.api_token, tenant_settings.api_token),
                auto_activation_enabled = COALESCE($4, tenant_settings.auto_activation_enabled),
                sync_enabled = COALESCE($5, tenant_settings.sync_enabled),
                processing_time_text = COALESCE(EXCLUDED.processing_time_text, tenant_settings.processing_time_text),
                contact_email = COALESCE(EXCLUDED.contact_email, tenant_settings.contact_email),
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(input.campaign_id)
        .bind(input.api_token)
        .bind(input.auto_activation_enabled)
        .bind(input.sync_enabled)
        .bind(input.processing_time_text)
        .bind(input.contact_email)
        .fetch_one(executor)
        .await?;

        Ok(settings)
    }
}
