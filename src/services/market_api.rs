// src/services/market_api.rs
//
// Acesso à API do marketplace por trás de um trait, para que o motor de
// sincronização e o fulfillment possam ser exercitados contra um dublê
// nos testes. Todas as chamadas têm timeout limitado; erro de transporte
// é reportado ao chamador e nunca re-tentado aqui dentro.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

use crate::{
    common::error::AppError,
    models::market::{DeliveryItem, RemoteOffer, RemoteOrder},
    models::settings::TenantSettings,
};

#[async_trait]
pub trait MarketApi: Send + Sync {
    /// Lista todas as ofertas do catálogo da loja.
    async fn list_offers(&self, settings: &TenantSettings) -> Result<Vec<RemoteOffer>, AppError>;

    /// Lista os pedidos recentes da loja, para o passe de reconciliação.
    async fn list_recent_orders(
        &self,
        settings: &TenantSettings,
    ) -> Result<Vec<RemoteOrder>, AppError>;

    /// Busca o pedido completo, direto da fonte da verdade.
    async fn get_order(
        &self,
        settings: &TenantSettings,
        remote_order_id: &str,
    ) -> Result<RemoteOrder, AppError>;

    /// Entrega os códigos de todos os itens digitais do pedido em uma única
    /// chamada. Tudo-ou-nada do ponto de vista do marketplace.
    async fn deliver_digital_goods(
        &self,
        settings: &TenantSettings,
        remote_order_id: &str,
        items: &[DeliveryItem],
    ) -> Result<(), AppError>;
}

// --- Implementação HTTP ---

pub struct HttpMarketApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpMarketApi {
    pub fn new(base_url: String) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { http, base_url })
    }

    /// Credenciais obrigatórias da loja; sem elas nenhuma chamada sai.
    fn credentials<'a>(
        &self,
        settings: &'a TenantSettings,
    ) -> Result<(&'a str, &'a str), AppError> {
        let campaign = settings
            .campaign_id
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or(AppError::MarketNotConfigured)?;
        let token = settings
            .api_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(AppError::MarketNotConfigured)?;
        Ok((campaign, token))
    }

    async fn get_json(&self, url: &str, token: &str) -> Result<Value, AppError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn parse_response(response: reqwest::Response) -> Result<Value, AppError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::MarketRejected(format!("{status}: {body}")));
        }
        Ok(response.json::<Value>().await?)
    }
}

#[async_trait]
impl MarketApi for HttpMarketApi {
    async fn list_offers(&self, settings: &TenantSettings) -> Result<Vec<RemoteOffer>, AppError> {
        let (campaign, token) = self.credentials(settings)?;
        let url = format!("{}/campaigns/{}/offers.json", self.base_url, campaign);
        let body = self.get_json(&url, token).await?;

        let offers = body
            .get("offers")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default();
        Ok(offers.into_iter().map(RemoteOffer::from_value).collect())
    }

    async fn list_recent_orders(
        &self,
        settings: &TenantSettings,
    ) -> Result<Vec<RemoteOrder>, AppError> {
        let (campaign, token) = self.credentials(settings)?;
        let url = format!("{}/campaigns/{}/orders.json", self.base_url, campaign);
        let body = self.get_json(&url, token).await?;

        let mut orders = Vec::new();
        for raw in body
            .get("orders")
            .and_then(|v| v.as_array())
            .cloned()
            .unwrap_or_default()
        {
            match RemoteOrder::from_value(raw) {
                Ok(order) => orders.push(order),
                // Um payload torto não derruba a lista inteira.
                Err(e) => tracing::warn!("Pedido remoto com payload inválido ignorado: {}", e),
            }
        }
        Ok(orders)
    }

    async fn get_order(
        &self,
        settings: &TenantSettings,
        remote_order_id: &str,
    ) -> Result<RemoteOrder, AppError> {
        let (campaign, token) = self.credentials(settings)?;
        let url = format!(
            "{}/campaigns/{}/orders/{}.json",
            self.base_url, campaign, remote_order_id
        );
        let body = self.get_json(&url, token).await?;

        let raw = body.get("order").cloned().unwrap_or(body);
        RemoteOrder::from_value(raw)
            .map_err(|e| AppError::MarketRejected(format!("payload de pedido inválido: {e}")))
    }

    async fn deliver_digital_goods(
        &self,
        settings: &TenantSettings,
        remote_order_id: &str,
        items: &[DeliveryItem],
    ) -> Result<(), AppError> {
        let (campaign, token) = self.credentials(settings)?;
        let url = format!(
            "{}/campaigns/{}/orders/{}/deliverDigitalGoods.json",
            self.base_url, campaign, remote_order_id
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&json!({ "items": items }))
            .send()
            .await?;
        Self::parse_response(response).await?;
        Ok(())
    }
}
