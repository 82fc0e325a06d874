// src/services/catalog_service.rs

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::ProductRepository,
    models::market::RemoteOffer,
    models::product::{Product, ProductType},
};

#[derive(Debug, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSyncSummary {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
}

#[derive(Clone)]
pub struct CatalogService {
    product_repo: ProductRepository,
    pool: PgPool,
}

impl CatalogService {
    pub fn new(product_repo: ProductRepository, pool: PgPool) -> Self {
        Self { product_repo, pool }
    }

    pub async fn list_products(&self, tenant_id: Uuid) -> Result<Vec<Product>, AppError> {
        self.product_repo.get_all(&self.pool, tenant_id).await
    }

    pub async fn get_product(&self, tenant_id: Uuid, id: Uuid) -> Result<Product, AppError> {
        self.product_repo
            .find_by_id(&self.pool, tenant_id, id)
            .await?
            .ok_or(AppError::ProductNotFound)
    }

    /// Edições locais do produto: tipo, template, custo, fornecedor, ativo.
    /// O sync de catálogo nunca passa por aqui.
    #[allow(clippy::too_many_arguments)]
    pub async fn update_product(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        product_type: Option<ProductType>,
        template_id: Option<Uuid>,
        purchase_cost: Option<Decimal>,
        supplier: Option<&str>,
        active: Option<bool>,
    ) -> Result<Product, AppError> {
        self.product_repo
            .update_local_fields(
                &self.pool,
                tenant_id,
                id,
                product_type,
                template_id,
                purchase_cost,
                supplier,
                active,
            )
            .await
    }

    /// Espelha o catálogo remoto no local. Cada oferta vira um produto; as
    /// já conhecidas têm só os campos remotos atualizados.
    pub async fn sync_catalog(
        &self,
        tenant_id: Uuid,
        offers: &[RemoteOffer],
    ) -> Result<CatalogSyncSummary, AppError> {
        let mut summary = CatalogSyncSummary::default();
        let mut tx = self.pool.begin().await?;

        for offer in offers {
            // Oferta sem nenhuma chave não tem como ser casada depois.
            let keys: Vec<String> = [offer.offer_id.as_deref(), offer.shop_sku.as_deref()]
                .into_iter()
                .flatten()
                .map(str::to_owned)
                .collect();
            if keys.is_empty() {
                summary.skipped += 1;
                tracing::warn!("Oferta sem offerId/shopSku ignorada no sync de catálogo");
                continue;
            }

            let existing = self
                .product_repo
                .find_by_external_keys(&mut *tx, tenant_id, &keys)
                .await?;

            match existing {
                Some(product) => {
                    self.product_repo
                        .update_remote_fields(
                            &mut *tx,
                            product.id,
                            offer.name.as_deref(),
                            &offer.raw,
                            offer.available,
                        )
                        .await?;
                    summary.updated += 1;
                }
                None => {
                    match self
                        .product_repo
                        .insert_from_offer(&mut *tx, tenant_id, offer)
                        .await
                    {
                        Ok(_) => summary.created += 1,
                        // Corrida com outro passe de sync: alguém inseriu
                        // primeiro, cai no caminho de atualização.
                        Err(AppError::DatabaseError(e))
                            if e.as_database_error()
                                .map(|d| d.is_unique_violation())
                                .unwrap_or(false) =>
                        {
                            if let Some(product) = self
                                .product_repo
                                .find_by_external_keys(&mut *tx, tenant_id, &keys)
                                .await?
                            {
                                self.product_repo
                                    .update_remote_fields(
                                        &mut *tx,
                                        product.id,
                                        offer.name.as_deref(),
                                        &offer.raw,
                                        offer.available,
                                    )
                                    .await?;
                                summary.updated += 1;
                            }
                        }
                        Err(e) => return Err(e),
                    }
                }
            }
        }

        tx.commit().await?;
        tracing::info!(
            "Sync de catálogo: {} criados, {} atualizados, {} ignorados",
            summary.created,
            summary.updated,
            summary.skipped
        );
        Ok(summary)
    }
}
