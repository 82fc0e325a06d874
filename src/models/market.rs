// src/models/market.rs
//
// DTOs dos payloads do marketplace. O payload completo fica guardado como
// JSON opaco (coluna snapshot); aqui só tipamos os poucos caminhos que o
// motor realmente lê: itens, status e comprador.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Converte um valor JSON (string ou número) para a forma de string.
/// Os ids do marketplace aparecem ora como número, ora como string.
pub fn json_value_to_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// --- Pedido remoto ---

#[derive(Debug, Clone)]
pub struct RemoteOrder {
    pub id: String,
    pub status: String,
    pub items: Vec<RemoteOrderItem>,
    pub buyer: Option<RemoteBuyer>,
    /// Payload bruto, persistido como snapshot do registro local.
    pub raw: Value,
}

impl RemoteOrder {
    /// Extrai os campos tipados de um payload bruto, preservando o original.
    pub fn from_value(raw: Value) -> Result<Self, serde_json::Error> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Parsed {
            id: Value,
            #[serde(default)]
            status: Option<String>,
            #[serde(default)]
            items: Vec<RemoteOrderItem>,
            #[serde(default)]
            buyer: Option<RemoteBuyer>,
        }

        let parsed: Parsed = serde_json::from_value(raw.clone())?;
        Ok(RemoteOrder {
            id: json_value_to_string(&parsed.id),
            status: parsed.status.unwrap_or_default(),
            items: parsed.items,
            buyer: parsed.buyer,
            raw,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteOrderItem {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub offer_id: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub shop_sku: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub market_sku: Option<String>,
    #[serde(default = "default_count")]
    pub count: i32,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub digital_item: Option<bool>,
}

fn default_count() -> i32 {
    1
}

impl RemoteOrderItem {
    /// Chaves de casamento na ordem das estratégias 1 e 2 do matcher.
    pub fn primary_keys(&self) -> Vec<&str> {
        [self.offer_id.as_deref(), self.shop_sku.as_deref()]
            .into_iter()
            .flatten()
            .collect()
    }

    /// Todas as chaves conhecidas do item, para a varredura de snapshot.
    pub fn all_keys(&self) -> Vec<&str> {
        [
            self.offer_id.as_deref(),
            self.shop_sku.as_deref(),
            self.market_sku.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Valor da linha: preço unitário x quantidade.
    pub fn line_amount(&self) -> Decimal {
        self.price * Decimal::from(self.count)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteBuyer {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

// --- Oferta do catálogo remoto ---

#[derive(Debug, Clone)]
pub struct RemoteOffer {
    pub offer_id: Option<String>,
    pub shop_sku: Option<String>,
    pub name: Option<String>,
    pub available: bool,
    pub raw: Value,
}

impl RemoteOffer {
    pub fn from_value(raw: Value) -> Self {
        let get = |k: &str| raw.get(k).map(json_value_to_string);
        RemoteOffer {
            offer_id: get("offerId"),
            shop_sku: get("shopSku"),
            name: raw
                .get("name")
                .and_then(|v| v.as_str())
                .map(str::to_owned),
            available: raw
                .get("available")
                .and_then(|v| v.as_bool())
                .unwrap_or(true),
            raw,
        }
    }

    /// Chave preferencial da oferta para o upsert do catálogo.
    pub fn key(&self) -> Option<&str> {
        self.offer_id.as_deref().or(self.shop_sku.as_deref())
    }
}

// --- Payload de entrega digital ---

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DeliveryItem {
    pub id: i64,
    pub codes: Vec<String>,
    pub instructions: String,
    #[schema(example = "2026-09-03")]
    pub activate_till: String,
}

fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(deserializer)?;
    Ok(match v {
        None | Some(Value::Null) => None,
        Some(other) => Some(json_value_to_string(&other)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parseia_pedido_com_ids_numericos() {
        let raw = json!({
            "id": 33510846,
            "status": "DELIVERY",
            "items": [
                {"id": 1, "offerId": "SKU-1", "count": 2, "price": "150.00"},
                {"id": 2, "shopSku": 777, "digitalItem": true}
            ],
            "buyer": {"id": 90210, "firstName": "Ana"}
        });

        let pedido = RemoteOrder::from_value(raw).unwrap();
        assert_eq!(pedido.id, "33510846");
        assert_eq!(pedido.status, "DELIVERY");
        assert_eq!(pedido.items.len(), 2);
        assert_eq!(pedido.items[0].offer_id.as_deref(), Some("SKU-1"));
        assert_eq!(pedido.items[0].line_amount(), Decimal::new(30000, 2));
        assert_eq!(pedido.items[1].shop_sku.as_deref(), Some("777"));
        assert_eq!(pedido.items[1].count, 1);
        assert_eq!(pedido.buyer.unwrap().id.as_deref(), Some("90210"));
    }

    #[test]
    fn item_expande_chaves_na_ordem_das_estrategias() {
        let item: RemoteOrderItem = serde_json::from_value(json!({
            "offerId": "A", "shopSku": "B", "marketSku": 42
        }))
        .unwrap();
        assert_eq!(item.primary_keys(), vec!["A", "B"]);
        assert_eq!(item.all_keys(), vec!["A", "B", "42"]);
    }
}
