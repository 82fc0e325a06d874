// src/services/order_service.rs

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{OrderRepository, ProductRepository},
    models::market::{RemoteBuyer, RemoteOrder},
    models::order::{MarketOrder, OrderStatus},
};

/// Resultado de um passe de upsert sobre um pedido remoto, consumido pelo
/// reconciliador para disparar os efeitos colaterais.
#[derive(Debug)]
pub struct UpsertOutcome {
    pub remote_order_id: String,
    pub mapped_status: OrderStatus,
    pub records: Vec<MarketOrder>,
    pub skipped_items: usize,
    /// Cancelamento observado agora (estado anterior não era todo Cancelled).
    pub newly_cancelled: bool,
    /// Grupo concluído agora (nenhum registro tinha completed_at antes).
    pub newly_completed: bool,
    pub buyer: Option<RemoteBuyer>,
    pub total_amount: Decimal,
}

#[derive(Clone)]
pub struct OrderService {
    order_repo: OrderRepository,
    product_repo: ProductRepository,
    pool: PgPool,
}

impl OrderService {
    pub fn new(order_repo: OrderRepository, product_repo: ProductRepository, pool: PgPool) -> Self {
        Self {
            order_repo,
            product_repo,
            pool,
        }
    }

    pub async fn list_orders(
        &self,
        tenant_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<MarketOrder>, AppError> {
        self.order_repo
            .list(&self.pool, tenant_id, limit, offset)
            .await
    }

    pub async fn get_group(
        &self,
        tenant_id: Uuid,
        remote_order_id: &str,
    ) -> Result<Vec<MarketOrder>, AppError> {
        let group = self
            .order_repo
            .find_group(&self.pool, tenant_id, remote_order_id)
            .await?;
        if group.is_empty() {
            return Err(AppError::OrderNotFound(remote_order_id.to_string()));
        }
        Ok(group)
    }

    /// Ação manual de finalização: o pedido sai do fluxo de sync e só volta
    /// a mudar de status por cancelamento.
    pub async fn mark_finished(
        &self,
        tenant_id: Uuid,
        remote_order_id: &str,
    ) -> Result<Vec<MarketOrder>, AppError> {
        let mut tx = self.pool.begin().await?;
        let affected = self
            .order_repo
            .mark_group_finished(&mut *tx, tenant_id, remote_order_id)
            .await?;
        if affected == 0 {
            return Err(AppError::OrderNotFound(remote_order_id.to_string()));
        }
        let group = self
            .order_repo
            .find_group(&mut *tx, tenant_id, remote_order_id)
            .await?;
        tx.commit().await?;
        Ok(group)
    }

    /// LÓGICA DE NEGÓCIO central do sync: espelha um pedido remoto nos
    /// registros locais, um registro por item casado, dentro de uma única
    /// transação. Item sem produto correspondente é pulado (pode ser de
    /// outro vendedor no mesmo pedido), nunca aborta o lote.
    pub async fn sync_remote_order(
        &self,
        tenant_id: Uuid,
        remote: &RemoteOrder,
    ) -> Result<UpsertOutcome, AppError> {
        let mapped = OrderStatus::from_remote(&remote.status);
        let mut tx = self.pool.begin().await?;

        // Estado anterior do grupo, para detectar transições novas.
        let previous = self
            .order_repo
            .find_group(&mut *tx, tenant_id, &remote.id)
            .await?;
        let previously_all_cancelled =
            !previous.is_empty() && previous.iter().all(|o| o.status == OrderStatus::Cancelled);
        let previously_completed = previous.iter().any(|o| o.completed_at.is_some());

        let mut records = Vec::new();
        let mut skipped_items = 0usize;

        for item in &remote.items {
            // 1. Casa o item com o catálogo local
            let product = self
                .product_repo
                .match_remote_item(&mut *tx, tenant_id, item)
                .await?;
            let Some(product) = product else {
                skipped_items += 1;
                tracing::debug!(
                    "Pedido {}: item sem produto correspondente ({:?}), pulado",
                    remote.id,
                    item.all_keys()
                );
                continue;
            };

            // 2. Cria ou atualiza o registro (remote_order_id, product_id)
            let existing = self
                .order_repo
                .find_by_remote_and_product(&mut *tx, tenant_id, &remote.id, product.id)
                .await?;

            let record = match existing {
                Some(current) => {
                    self.refresh_record(&mut *tx, &current, item, mapped, remote)
                        .await?
                }
                None => {
                    let inserted = self
                        .order_repo
                        .try_insert(
                            &mut *tx,
                            tenant_id,
                            &remote.id,
                            product.id,
                            item.count,
                            item.line_amount(),
                            mapped,
                            &remote.status,
                            &remote.raw,
                        )
                        .await?;
                    match inserted {
                        Some(record) => record,
                        // Corrida perdida contra outro passe de sync:
                        // o registro já existe, cai no update.
                        None => {
                            let current = self
                                .order_repo
                                .find_by_remote_and_product(
                                    &mut *tx,
                                    tenant_id,
                                    &remote.id,
                                    product.id,
                                )
                                .await?
                                .ok_or_else(|| {
                                    anyhow::anyhow!(
                                        "registro do pedido {} sumiu após conflito de inserção",
                                        remote.id
                                    )
                                })?;
                            self.refresh_record(&mut *tx, &current, item, mapped, remote)
                                .await?
                        }
                    }
                }
            };
            records.push(record);
        }

        // 3. Auto-conclusão: entregue + todos enviados + nenhum finalizado
        let mut group = self
            .order_repo
            .find_group(&mut *tx, tenant_id, &remote.id)
            .await?;
        if should_auto_complete(mapped, &group) {
            self.order_repo
                .promote_group_completed(&mut *tx, tenant_id, &remote.id)
                .await?;
            group = self
                .order_repo
                .find_group(&mut *tx, tenant_id, &remote.id)
                .await?;
        }

        tx.commit().await?;

        let newly_cancelled = mapped == OrderStatus::Cancelled
            && !previous.is_empty()
            && !previously_all_cancelled;
        let newly_completed =
            !previously_completed && group.iter().any(|o| o.completed_at.is_some());
        let total_amount = group.iter().map(|o| o.amount).sum();

        Ok(UpsertOutcome {
            remote_order_id: remote.id.clone(),
            mapped_status: mapped,
            records: group,
            skipped_items,
            newly_cancelled,
            newly_completed,
            buyer: remote.buyer.clone(),
            total_amount,
        })
    }

    /// Refresh de um registro existente: snapshot, quantidade, valor e status
    /// bruto sempre; o status local passa pela guarda de transição antes.
    async fn refresh_record(
        &self,
        tx: &mut sqlx::PgConnection,
        current: &MarketOrder,
        item: &crate::models::market::RemoteOrderItem,
        mapped: OrderStatus,
        remote: &RemoteOrder,
    ) -> Result<MarketOrder, AppError> {
        let status = OrderStatus::apply_remote(current.status, mapped);
        if status != mapped {
            tracing::info!(
                "Pedido {}: status {:?} descartado pela guarda (registro finalizado)",
                remote.id,
                mapped
            );
        }
        self.order_repo
            .update_sync_fields(
                &mut *tx,
                current.id,
                item.count,
                item.line_amount(),
                status,
                &remote.status,
                &remote.raw,
            )
            .await
    }
}

/// O grupo pode ser promovido a `Completed` quando o marketplace diz
/// "entregue", todos os irmãos já tiveram os códigos enviados e nenhum
/// foi finalizado manualmente.
pub fn should_auto_complete(mapped: OrderStatus, group: &[MarketOrder]) -> bool {
    mapped == OrderStatus::Completed
        && !group.is_empty()
        && group.iter().all(|o| o.sent)
        && group.iter().all(|o| o.status != OrderStatus::Finished)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn record(status: OrderStatus, sent: bool) -> MarketOrder {
        MarketOrder {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            remote_order_id: "100-1".into(),
            product_id: Uuid::new_v4(),
            quantity: 1,
            amount: Decimal::new(10000, 2),
            status,
            remote_status: "DELIVERED".into(),
            snapshot: None,
            activation_code_id: None,
            sent,
            sent_at: None,
            completed_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn promove_grupo_entregue_com_todos_enviados() {
        let group = vec![
            record(OrderStatus::Processing, true),
            record(OrderStatus::Processing, true),
        ];
        assert!(should_auto_complete(OrderStatus::Completed, &group));
    }

    #[test]
    fn nao_promove_com_irmao_nao_enviado() {
        let group = vec![
            record(OrderStatus::Processing, true),
            record(OrderStatus::Processing, false),
        ];
        assert!(!should_auto_complete(OrderStatus::Completed, &group));
    }

    #[test]
    fn nao_promove_com_irmao_finalizado() {
        let group = vec![
            record(OrderStatus::Finished, true),
            record(OrderStatus::Processing, true),
        ];
        assert!(!should_auto_complete(OrderStatus::Completed, &group));
    }

    #[test]
    fn nao_promove_fora_do_status_entregue() {
        let group = vec![record(OrderStatus::Processing, true)];
        assert!(!should_auto_complete(OrderStatus::Processing, &group));
        assert!(!should_auto_complete(OrderStatus::Pending, &group));
    }

    #[test]
    fn grupo_vazio_nunca_promove() {
        assert!(!should_auto_complete(OrderStatus::Completed, &[]));
    }
}
