// src/services/sync_service.rs
//
// Reconciliador: o mesmo ponto de entrada atende o webhook do marketplace
// e o passe periódico, garantindo semântica idêntica nos dois caminhos.

use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::SettingsRepository,
    models::market::RemoteOrder,
    models::settings::TenantSettings,
    services::catalog_service::{CatalogService, CatalogSyncSummary},
    services::customer_service::CustomerService,
    services::fulfillment_service::{AutoFulfillOutcome, FulfillmentService},
    services::market_api::MarketApi,
    services::order_service::{OrderService, UpsertOutcome},
};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileSummary {
    pub catalog: CatalogSyncSummary,
    pub orders_synced: usize,
    pub orders_failed: usize,
    pub auto_fulfilled: usize,
}

#[derive(Clone)]
pub struct SyncService {
    settings_repo: SettingsRepository,
    catalog_service: CatalogService,
    order_service: OrderService,
    fulfillment_service: FulfillmentService,
    customer_service: CustomerService,
    market: Arc<dyn MarketApi>,
    pool: PgPool,
}

impl SyncService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        settings_repo: SettingsRepository,
        catalog_service: CatalogService,
        order_service: OrderService,
        fulfillment_service: FulfillmentService,
        customer_service: CustomerService,
        market: Arc<dyn MarketApi>,
        pool: PgPool,
    ) -> Self {
        Self {
            settings_repo,
            catalog_service,
            order_service,
            fulfillment_service,
            customer_service,
            market,
            pool,
        }
    }

    /// Ponto de entrada único para um pedido remoto, venha do webhook ou do
    /// poll: upsert, efeitos colaterais e gatilho de auto-ativação.
    pub async fn process_remote_order(
        &self,
        tenant_id: Uuid,
        remote: &RemoteOrder,
    ) -> Result<UpsertOutcome, AppError> {
        let outcome = self.order_service.sync_remote_order(tenant_id, remote).await?;

        // Efeitos colaterais no histórico de compras: fire-and-forget.
        if outcome.newly_completed {
            if let Err(e) = self
                .customer_service
                .record_completed_order(tenant_id, &outcome)
                .await
            {
                tracing::warn!(
                    "Pedido {}: falha ao registrar compra no histórico: {}",
                    outcome.remote_order_id,
                    e
                );
            }
        }
        if outcome.newly_cancelled {
            if let Err(e) = self
                .customer_service
                .rollback_cancelled_order(tenant_id, &outcome)
                .await
            {
                tracing::warn!(
                    "Pedido {}: falha ao desfazer compra no histórico: {}",
                    outcome.remote_order_id,
                    e
                );
            }
        }

        Ok(outcome)
    }

    /// process_remote_order + gatilho de auto-ativação. Falha do gatilho é
    /// logada e não derruba o sync do pedido.
    pub async fn process_and_auto_fulfill(
        &self,
        tenant_id: Uuid,
        remote: &RemoteOrder,
    ) -> Result<(UpsertOutcome, bool), AppError> {
        let outcome = self.process_remote_order(tenant_id, remote).await?;

        if outcome.records.is_empty() {
            return Ok((outcome, false));
        }
        let auto_fulfilled = match self
            .fulfillment_service
            .try_auto_fulfill(tenant_id, &outcome.remote_order_id)
            .await
        {
            Ok(AutoFulfillOutcome::Completed(report)) => {
                tracing::info!(
                    "✅ Pedido {}: auto-ativação entregou {} código(s)",
                    outcome.remote_order_id,
                    report.delivered.len()
                );
                true
            }
            Ok(AutoFulfillOutcome::Skipped { .. }) => false,
            Err(e) => {
                tracing::warn!(
                    "Pedido {}: auto-ativação falhou: {}",
                    outcome.remote_order_id,
                    e
                );
                false
            }
        };
        Ok((outcome, auto_fulfilled))
    }

    /// Passe completo de uma loja: catálogo primeiro, depois cada pedido
    /// recente. Um pedido ruim nunca interrompe o lote.
    pub async fn reconcile_tenant(
        &self,
        settings: &TenantSettings,
    ) -> Result<ReconcileSummary, AppError> {
        let tenant_id = settings.tenant_id;

        // 1. Espelha o catálogo remoto
        let offers = self.market.list_offers(settings).await?;
        let catalog = self.catalog_service.sync_catalog(tenant_id, &offers).await?;

        // 2. Reconcilia os pedidos recentes, um a um
        let orders = self.market.list_recent_orders(settings).await?;
        let mut orders_synced = 0usize;
        let mut orders_failed = 0usize;
        let mut auto_fulfilled = 0usize;

        for remote in &orders {
            match self.process_and_auto_fulfill(tenant_id, remote).await {
                Ok((_, fulfilled)) => {
                    orders_synced += 1;
                    if fulfilled {
                        auto_fulfilled += 1;
                    }
                }
                Err(e) => {
                    orders_failed += 1;
                    tracing::error!("🔥 Pedido {} falhou na reconciliação: {}", remote.id, e);
                }
            }
        }

        tracing::info!(
            "Loja {}: {} pedido(s) sincronizado(s), {} falha(s), {} auto-ativado(s)",
            tenant_id,
            orders_synced,
            orders_failed,
            auto_fulfilled
        );
        Ok(ReconcileSummary {
            catalog,
            orders_synced,
            orders_failed,
            auto_fulfilled,
        })
    }

    /// Reconciliação sob demanda de uma loja específica (endpoint manual).
    pub async fn reconcile_by_tenant_id(&self, tenant_id: Uuid) -> Result<ReconcileSummary, AppError> {
        let settings = self.settings_repo.get_settings(&self.pool, tenant_id).await?;
        self.reconcile_tenant(&settings).await
    }

    /// Uma rodada do passe periódico sobre todas as lojas habilitadas.
    pub async fn reconcile_all(&self) {
        let tenants = match self.settings_repo.list_sync_enabled(&self.pool).await {
            Ok(tenants) => tenants,
            Err(e) => {
                tracing::error!("🔥 Falha ao listar lojas para o sync periódico: {}", e);
                return;
            }
        };

        for settings in tenants {
            if let Err(e) = self.reconcile_tenant(&settings).await {
                // Uma loja com problema não bloqueia as demais.
                tracing::error!(
                    "🔥 Reconciliação da loja {} falhou: {}",
                    settings.tenant_id,
                    e
                );
            }
        }
    }

    /// Tarefa de fundo: poll do marketplace em intervalo fixo.
    pub async fn run_periodic(self, interval_secs: u64) {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(30)));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tracing::info!("Sync periódico ligado (a cada {}s)", interval_secs.max(30));
        loop {
            interval.tick().await;
            self.reconcile_all().await;
        }
    }
}
