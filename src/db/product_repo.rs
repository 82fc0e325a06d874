// src/db/product_repo.rs

use serde_json::Value;
use sqlx::{Executor, PgConnection, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::market::{RemoteOffer, RemoteOrderItem},
    models::product::{Product, ProductType},
};

#[derive(Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Funções de "Leitura" (Getters)
    // ---

    pub async fn get_all<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<Vec<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE tenant_id = $1 ORDER BY name ASC",
        )
        .bind(tenant_id)
        .fetch_all(executor)
        .await?;
        Ok(products)
    }

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(product)
    }

    /// Busca exata pelas chaves externas: qualquer uma das chaves contra
    /// external_id OU external_sku.
    pub async fn find_by_external_keys<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        keys: &[String],
    ) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if keys.is_empty() {
            return Ok(None);
        }
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT * FROM products
            WHERE tenant_id = $1
              AND (external_id = ANY($2) OR external_sku = ANY($2))
            LIMIT 1
            "#,
        )
        .bind(tenant_id)
        .bind(keys)
        .fetch_optional(executor)
        .await?;
        Ok(product)
    }

    // ---
    // Matcher de itens remotos
    // ---
    // Estratégias ordenadas, a primeira que casar vence:
    //   1. offerId / shopSku contra external_id ou external_sku
    //   2. marketSku contra os mesmos campos
    //   3. varredura do snapshot JSONB de cada produto
    // Recebe a conexão concreta porque dispara mais de uma query.
    pub async fn match_remote_item(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        item: &RemoteOrderItem,
    ) -> Result<Option<Product>, AppError> {
        // 1. Chaves primárias do item (offerId, shopSku)
        let primary: Vec<String> = item.primary_keys().iter().map(|s| s.to_string()).collect();
        if let Some(p) = self
            .find_by_external_keys(&mut *conn, tenant_id, &primary)
            .await?
        {
            return Ok(Some(p));
        }

        // 2. marketSku, quando presente
        if let Some(market_sku) = item.market_sku.as_deref() {
            let keys = vec![market_sku.to_string()];
            if let Some(p) = self
                .find_by_external_keys(&mut *conn, tenant_id, &keys)
                .await?
            {
                return Ok(Some(p));
            }
        }

        // 3. Fallback: alguma chave do item escondida dentro do card remoto
        let needles: Vec<&str> = item.all_keys();
        if needles.is_empty() {
            return Ok(None);
        }
        let candidates = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE tenant_id = $1 AND snapshot IS NOT NULL",
        )
        .bind(tenant_id)
        .fetch_all(&mut *conn)
        .await?;

        for candidate in candidates {
            if let Some(snapshot) = candidate.snapshot.as_ref() {
                if snapshot_contains(snapshot, &needles) {
                    return Ok(Some(candidate));
                }
            }
        }
        Ok(None)
    }

    // ---
    // Escritas do sync de catálogo (somente campos remotos)
    // ---

    pub async fn insert_from_offer<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        offer: &RemoteOffer,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (tenant_id, name, product_type, external_id, external_sku, snapshot, active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(offer.name.clone().unwrap_or_else(|| {
            offer
                .key()
                .map(str::to_owned)
                .unwrap_or_else(|| "Oferta sem nome".to_string())
        }))
        .bind(ProductType::Physical)
        .bind(offer.offer_id.as_deref())
        .bind(offer.shop_sku.as_deref())
        .bind(&offer.raw)
        .bind(offer.available)
        .fetch_one(executor)
        .await?;
        Ok(product)
    }

    /// Atualiza apenas os campos espelhados do marketplace. Custo, fornecedor
    /// e template são edições locais e ficam intocados.
    pub async fn update_remote_fields<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        name: Option<&str>,
        snapshot: &Value,
        active: bool,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET name = COALESCE($2, name),
                snapshot = $3,
                active = $4,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(snapshot)
        .bind(active)
        .fetch_one(executor)
        .await?;
        Ok(product)
    }

    // ---
    // Edições locais (nunca tocadas pelo sync)
    // ---

    #[allow(clippy::too_many_arguments)]
    pub async fn update_local_fields<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        id: Uuid,
        product_type: Option<ProductType>,
        template_id: Option<Uuid>,
        purchase_cost: Option<rust_decimal::Decimal>,
        supplier: Option<&str>,
        active: Option<bool>,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET product_type = COALESCE($3, product_type),
                template_id = COALESCE($4, template_id),
                purchase_cost = COALESCE($5, purchase_cost),
                supplier = COALESCE($6, supplier),
                active = COALESCE($7, active),
                updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(product_type)
        .bind(template_id)
        .bind(purchase_cost)
        .bind(supplier)
        .bind(active)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::ProductNotFound)?;
        Ok(product)
    }
}

/// Varredura recursiva do snapshot: algum valor aninhado (string ou número)
/// igual a uma das chaves do item remoto.
pub fn snapshot_contains(value: &Value, needles: &[&str]) -> bool {
    match value {
        Value::String(s) => needles.contains(&s.as_str()),
        Value::Number(n) => needles.contains(&n.to_string().as_str()),
        Value::Array(items) => items.iter().any(|v| snapshot_contains(v, needles)),
        Value::Object(map) => map.values().any(|v| snapshot_contains(v, needles)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn acha_chave_aninhada_no_snapshot() {
        let snapshot = json!({
            "offerId": "X",
            "card": { "identifiers": [ { "marketSku": 998877 } ] }
        });
        assert!(snapshot_contains(&snapshot, &["X"]));
        assert!(snapshot_contains(&snapshot, &["998877"]));
        assert!(!snapshot_contains(&snapshot, &["Y"]));
    }

    #[test]
    fn nao_casa_com_chave_de_campo_apenas_com_valor() {
        // "offerId" é nome de campo, não valor: não deve casar.
        let snapshot = json!({ "offerId": "ABC" });
        assert!(!snapshot_contains(&snapshot, &["offerId"]));
        assert!(snapshot_contains(&snapshot, &["ABC"]));
    }

    #[test]
    fn snapshot_vazio_nunca_casa() {
        assert!(!snapshot_contains(&json!({}), &["X"]));
        assert!(!snapshot_contains(&json!(null), &["X"]));
    }
}
