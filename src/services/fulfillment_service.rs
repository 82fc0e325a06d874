// src/services/fulfillment_service.rs

use chrono::{Days, Utc};
use serde::Serialize;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CodeRepository, OrderRepository, ProductRepository, SettingsRepository, TemplateRepository},
    models::code::ActivationCode,
    models::market::DeliveryItem,
    models::order::{MarketOrder, OrderStatus},
    models::product::Product,
    models::settings::TenantSettings,
    models::template::FulfillmentTemplate,
    services::market_api::MarketApi,
    services::order_service::OrderService,
};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeliveredLine {
    pub product_name: String,
    pub code: String,
    #[schema(example = "2026-09-03")]
    pub activate_till: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FulfillmentReport {
    pub remote_order_id: String,
    pub delivered: Vec<DeliveredLine>,
    /// O refetch de status pós-entrega pode falhar sem desfazer a entrega.
    pub status_resynced: bool,
}

#[derive(Debug)]
pub enum AutoFulfillOutcome {
    Completed(FulfillmentReport),
    Skipped { reason: String },
}

#[derive(Clone)]
pub struct FulfillmentService {
    order_repo: OrderRepository,
    product_repo: ProductRepository,
    code_repo: CodeRepository,
    template_repo: TemplateRepository,
    settings_repo: SettingsRepository,
    order_service: OrderService,
    market: Arc<dyn MarketApi>,
    pool: PgPool,
}

impl FulfillmentService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        order_repo: OrderRepository,
        product_repo: ProductRepository,
        code_repo: CodeRepository,
        template_repo: TemplateRepository,
        settings_repo: SettingsRepository,
        order_service: OrderService,
        market: Arc<dyn MarketApi>,
        pool: PgPool,
    ) -> Self {
        Self {
            order_repo,
            product_repo,
            code_repo,
            template_repo,
            settings_repo,
            order_service,
            market,
            pool,
        }
    }

    /// Entrega os códigos de ativação de TODOS os itens digitais do pedido
    /// remoto em uma única chamada ao marketplace.
    ///
    /// A resolução de códigos é commitada antes do despacho: se o
    /// marketplace falhar, os códigos continuam vinculados ao pedido e a
    /// nova tentativa reaproveita os mesmos, sem queimar códigos novos.
    pub async fn complete(
        &self,
        tenant_id: Uuid,
        remote_order_id: &str,
        manual_codes: &HashMap<Uuid, String>,
    ) -> Result<FulfillmentReport, AppError> {
        let settings = self.settings_repo.get_settings(&self.pool, tenant_id).await?;

        // 1. Snapshot canônico, direto da fonte da verdade. O snapshot local
        // pode estar desatualizado (itens adicionados depois do sync).
        let remote = self.market.get_order(&settings, remote_order_id).await?;

        let mut tx = self.pool.begin().await?;

        // 2. Re-casa cada item do snapshot fresco com o catálogo
        struct Pending {
            item_id: i64,
            product: Product,
            template: FulfillmentTemplate,
            record: MarketOrder,
        }
        let mapped = OrderStatus::from_remote(&remote.status);
        let mut pending: Vec<Pending> = Vec::new();
        let mut missing_templates: Vec<String> = Vec::new();

        for item in &remote.items {
            let Some(item_id) = item.id else {
                tracing::warn!("Pedido {}: item sem id no payload remoto, pulado", remote.id);
                continue;
            };
            let product = self
                .product_repo
                .match_remote_item(&mut *tx, tenant_id, item)
                .await?;
            let Some(product) = product else {
                // Item de outro vendedor no mesmo pedido, não é nosso.
                continue;
            };
            if !product.is_digital() {
                continue;
            }

            // Registro local: acha ou cria preguiçosamente
            let record = match self
                .order_repo
                .find_by_remote_and_product(&mut *tx, tenant_id, &remote.id, product.id)
                .await?
            {
                Some(record) => record,
                None => match self
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
                    .await?
                {
                    Some(record) => record,
                    None => self
                        .order_repo
                        .find_by_remote_and_product(&mut *tx, tenant_id, &remote.id, product.id)
                        .await?
                        .ok_or_else(|| {
                            anyhow::anyhow!("registro do pedido {} sumiu após conflito", remote.id)
                        })?,
                },
            };

            // 3. Pré-condição dura: todo item digital precisa de template.
            let template = match product.template_id {
                Some(template_id) => {
                    self.template_repo
                        .find_by_id(&mut *tx, tenant_id, template_id)
                        .await?
                }
                None => None,
            };
            match template {
                Some(template) => pending.push(Pending {
                    item_id,
                    product,
                    template,
                    record,
                }),
                None => missing_templates.push(product.name.clone()),
            }
        }

        // Aborta inteiro, sem entrega parcial, listando os produtos sem template.
        if !missing_templates.is_empty() {
            return Err(AppError::MissingTemplates(missing_templates));
        }
        if pending.is_empty() {
            return Err(AppError::NoDeliverableItems);
        }
        // Trava de idempotência antes do despacho.
        if pending.iter().any(|p| p.record.sent) {
            return Err(AppError::AlreadySent);
        }

        // 4. Resolve o código de cada item, por prioridade:
        //    manual informado > já vinculado > estoque pré-gerado > gerado novo
        let mut lines: Vec<(Pending, ActivationCode)> = Vec::new();
        for p in pending {
            let code = self
                .resolve_code(&mut *tx, manual_codes, &p.product, &p.template, &p.record)
                .await?;
            self.order_repo.bind_code(&mut *tx, p.record.id, code.id).await?;
            lines.push((p, code));
        }

        // Commit antes da chamada remota: códigos resolvidos sobrevivem a uma
        // falha de entrega e são reutilizados na nova tentativa.
        tx.commit().await?;

        // 5. Renderiza instruções e calcula a validade de cada item
        let today = Utc::now().date_naive();
        let mut payload = Vec::new();
        let mut delivered = Vec::new();
        for (p, code) in &lines {
            let activate_till = today
                .checked_add_days(Days::new(p.template.validity_days.max(0) as u64))
                .unwrap_or(today)
                .format("%Y-%m-%d")
                .to_string();
            payload.push(DeliveryItem {
                id: p.item_id,
                codes: vec![code.code.clone()],
                instructions: p.template.render(&settings),
                activate_till: activate_till.clone(),
            });
            delivered.push(DeliveredLine {
                product_name: p.product.name.clone(),
                code: code.code.clone(),
                activate_till,
            });
        }

        // 6. Uma única chamada, tudo-ou-nada do lado do marketplace
        self.market
            .deliver_digital_goods(&settings, &remote.id, &payload)
            .await?;

        // 7. Marca enviados; o WHERE sent = FALSE segura o fulfillment dobrado
        let mut tx = self.pool.begin().await?;
        for (p, _) in &lines {
            let marked = self.order_repo.mark_sent(&mut *tx, p.record.id).await?;
            if !marked {
                tracing::warn!(
                    "Pedido {}: registro {} já estava marcado como enviado",
                    remote.id,
                    p.record.id
                );
            }
        }
        tx.commit().await?;

        tracing::info!(
            "✅ Pedido {}: {} código(s) entregue(s) ao marketplace",
            remote.id,
            delivered.len()
        );

        // 8. Refetch do status autoritativo; a entrega já aconteceu, então
        // uma falha aqui só fica registrada.
        let status_resynced = match self.market.get_order(&settings, &remote.id).await {
            Ok(fresh) => match self.order_service.sync_remote_order(tenant_id, &fresh).await {
                Ok(_) => true,
                Err(e) => {
                    tracing::warn!("Pedido {}: re-sync pós-entrega falhou: {}", remote.id, e);
                    false
                }
            },
            Err(e) => {
                tracing::warn!("Pedido {}: refetch pós-entrega falhou: {}", remote.id, e);
                false
            }
        };

        Ok(FulfillmentReport {
            remote_order_id: remote.id,
            delivered,
            status_resynced,
        })
    }

    async fn resolve_code(
        &self,
        tx: &mut sqlx::PgConnection,
        manual_codes: &HashMap<Uuid, String>,
        product: &Product,
        template: &FulfillmentTemplate,
        record: &MarketOrder,
    ) -> Result<ActivationCode, AppError> {
        // (a) valor manual informado pelo operador
        if let Some(manual) = manual_codes.get(&product.id) {
            return self
                .code_repo
                .insert_used(&mut *tx, product.id, manual, record.id)
                .await;
        }
        // (b) código já vinculado em passe anterior
        if let Some(code_id) = record.activation_code_id {
            return self
                .code_repo
                .find_by_id(&mut *tx, code_id)
                .await?
                .ok_or_else(|| {
                    anyhow::anyhow!("código {} vinculado ao registro {} não existe", code_id, record.id).into()
                });
        }
        // (c) estoque pré-gerado do produto
        if let Some(code) = self
            .code_repo
            .claim_oldest_unused(&mut *tx, product.id, record.id)
            .await?
        {
            return Ok(code);
        }
        // (c') sem estoque: gera na hora, mas só para template automático;
        // template de código manual exige o valor informado por fora.
        if template.auto_generated {
            let generated = generate_code();
            return self
                .code_repo
                .insert_used(&mut *tx, product.id, &generated, record.id)
                .await;
        }
        Err(AppError::NoCodeAvailable(product.name.clone()))
    }

    /// Gatilho de auto-ativação, avaliado sobre o grupo inteiro do pedido
    /// logo após o upsert. Qualquer porta fechada registra o motivo e deixa
    /// o pedido em `Processing` para o próximo passe (ou ação manual).
    pub async fn try_auto_fulfill(
        &self,
        tenant_id: Uuid,
        remote_order_id: &str,
    ) -> Result<AutoFulfillOutcome, AppError> {
        // Configuração lida fresca a cada decisão, nunca cacheada.
        let settings = self.settings_repo.get_settings(&self.pool, tenant_id).await?;

        let group = self
            .order_repo
            .find_group(&self.pool, tenant_id, remote_order_id)
            .await?;

        // Carrega produto + template de cada irmão digital
        let mut digital: Vec<(MarketOrder, Product, Option<FulfillmentTemplate>)> = Vec::new();
        for record in &group {
            let Some(product) = self
                .product_repo
                .find_by_id(&self.pool, tenant_id, record.product_id)
                .await?
            else {
                continue;
            };
            if !product.is_digital() {
                continue;
            }
            let template = match product.template_id {
                Some(template_id) => {
                    self.template_repo
                        .find_by_id(&self.pool, tenant_id, template_id)
                        .await?
                }
                None => None,
            };
            digital.push((record.clone(), product, template));
        }

        if let Some(reason) = auto_fulfill_blocker(&settings, &group, &digital) {
            tracing::info!("Pedido {}: auto-ativação pulada: {}", remote_order_id, reason);
            return Ok(AutoFulfillOutcome::Skipped { reason });
        }

        // Auto-atribuição de código para quem ainda não tem: estoque
        // pré-gerado primeiro, geração na hora como último recurso (todos os
        // templates aqui já passaram pela porta de geração automática).
        let mut tx = self.pool.begin().await?;
        for (record, product, _) in &digital {
            if record.activation_code_id.is_some() {
                continue;
            }
            let code = match self
                .code_repo
                .claim_oldest_unused(&mut *tx, product.id, record.id)
                .await?
            {
                Some(code) => code,
                None => {
                    let generated = generate_code();
                    self.code_repo
                        .insert_used(&mut *tx, product.id, &generated, record.id)
                        .await?
                }
            };
            self.order_repo.bind_code(&mut *tx, record.id, code.id).await?;
        }
        tx.commit().await?;

        let report = self
            .complete(tenant_id, remote_order_id, &HashMap::new())
            .await?;
        Ok(AutoFulfillOutcome::Completed(report))
    }
}

/// Porta de decisão do gatilho automático. Retorna o primeiro motivo de
/// bloqueio, ou None quando o grupo inteiro está apto.
pub fn auto_fulfill_blocker(
    settings: &TenantSettings,
    group: &[MarketOrder],
    digital: &[(MarketOrder, Product, Option<FulfillmentTemplate>)],
) -> Option<String> {
    if !settings.auto_activation_enabled {
        return Some("auto-ativação desabilitada na loja".to_string());
    }
    if group.is_empty() {
        return Some("pedido sem registros locais".to_string());
    }
    if !group.iter().any(|o| o.status == OrderStatus::Processing) {
        return Some("pedido ainda não está em processamento".to_string());
    }
    if group.iter().any(|o| o.sent) {
        return Some("códigos já enviados para este pedido".to_string());
    }
    if digital.is_empty() {
        return Some("pedido sem itens digitais".to_string());
    }
    let sem_template: Vec<&str> = digital
        .iter()
        .filter(|(_, _, t)| t.is_none())
        .map(|(_, p, _)| p.name.as_str())
        .collect();
    if !sem_template.is_empty() {
        return Some(format!("produtos sem template: {}", sem_template.join(", ")));
    }
    let manuais: Vec<&str> = digital
        .iter()
        .filter(|(_, _, t)| t.as_ref().is_some_and(|t| !t.auto_generated))
        .map(|(_, p, _)| p.name.as_str())
        .collect();
    if !manuais.is_empty() {
        return Some(format!(
            "templates de código manual nunca são enviados automaticamente: {}",
            manuais.join(", ")
        ));
    }
    None
}

/// Código de ativação gerado na hora: 32 hex do UUID em grupos de 4.
pub fn generate_code() -> String {
    let raw = Uuid::new_v4().simple().to_string().to_uppercase();
    raw.as_bytes()
        .chunks(4)
        .map(|c| std::str::from_utf8(c).unwrap_or_default())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::product::ProductType;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn settings(auto: bool) -> TenantSettings {
        TenantSettings {
            auto_activation_enabled: auto,
            ..TenantSettings::empty(Uuid::new_v4())
        }
    }

    fn record(status: OrderStatus, sent: bool) -> MarketOrder {
        MarketOrder {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            remote_order_id: "55-1".into(),
            product_id: Uuid::new_v4(),
            quantity: 1,
            amount: Decimal::ZERO,
            status,
            remote_status: "PROCESSING".into(),
            snapshot: None,
            activation_code_id: None,
            sent,
            sent_at: None,
            completed_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn product(name: &str, template_id: Option<Uuid>) -> Product {
        Product {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            name: name.into(),
            product_type: ProductType::Digital,
            external_id: Some(name.into()),
            external_sku: None,
            snapshot: None,
            template_id,
            purchase_cost: None,
            supplier: None,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn template(auto_generated: bool) -> FulfillmentTemplate {
        FulfillmentTemplate {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            name: "t".into(),
            body: "corpo".into(),
            auto_generated,
            validity_days: 30,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn bloqueia_quando_auto_ativacao_desligada() {
        let group = vec![record(OrderStatus::Processing, false)];
        let reason = auto_fulfill_blocker(&settings(false), &group, &[]);
        assert!(reason.unwrap().contains("desabilitada"));
    }

    #[test]
    fn bloqueia_irmao_digital_sem_template() {
        let group = vec![record(OrderStatus::Processing, false)];
        let tid = Uuid::new_v4();
        let digital = vec![
            (record(OrderStatus::Processing, false), product("Com Template", Some(tid)), Some(template(true))),
            (record(OrderStatus::Processing, false), product("Sem Template", None), None),
        ];
        let reason = auto_fulfill_blocker(&settings(true), &group, &digital).unwrap();
        assert!(reason.contains("Sem Template"));
        assert!(!reason.contains("Com Template,"));
    }

    #[test]
    fn bloqueia_template_de_codigo_manual() {
        let group = vec![record(OrderStatus::Processing, false)];
        let tid = Uuid::new_v4();
        let digital = vec![(
            record(OrderStatus::Processing, false),
            product("Chave Manual", Some(tid)),
            Some(template(false)),
        )];
        let reason = auto_fulfill_blocker(&settings(true), &group, &digital).unwrap();
        assert!(reason.contains("manual"));
    }

    #[test]
    fn bloqueia_grupo_com_envio_anterior() {
        let group = vec![
            record(OrderStatus::Processing, true),
            record(OrderStatus::Processing, false),
        ];
        let digital = vec![(
            record(OrderStatus::Processing, false),
            product("P", Some(Uuid::new_v4())),
            Some(template(true)),
        )];
        let reason = auto_fulfill_blocker(&settings(true), &group, &digital).unwrap();
        assert!(reason.contains("já enviados"));
    }

    #[test]
    fn libera_grupo_apto() {
        let group = vec![record(OrderStatus::Processing, false)];
        let digital = vec![(
            record(OrderStatus::Processing, false),
            product("P", Some(Uuid::new_v4())),
            Some(template(true)),
        )];
        assert!(auto_fulfill_blocker(&settings(true), &group, &digital).is_none());
    }

    #[test]
    fn codigo_gerado_tem_formato_agrupado() {
        let code = generate_code();
        assert_eq!(code.len(), 32 + 7); // 8 grupos de 4 + 7 hífens
        assert!(code.chars().all(|c| c == '-' || c.is_ascii_uppercase() || c.is_ascii_digit()));
        assert_ne!(code, generate_code());
    }
}
