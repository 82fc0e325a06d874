// src/config.rs

use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, sync::Arc, time::Duration};

use crate::{
    db::{
        CodeRepository, CustomerRepository, OrderRepository, ProductRepository,
        SettingsRepository, TemplateRepository,
    },
    services::{
        catalog_service::CatalogService,
        customer_service::CustomerService,
        fulfillment_service::FulfillmentService,
        market_api::{HttpMarketApi, MarketApi},
        order_service::OrderService,
        sync_service::SyncService,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub settings_repo: SettingsRepository,
    pub template_repo: TemplateRepository,
    pub code_repo: CodeRepository,
    pub catalog_service: CatalogService,
    pub order_service: OrderService,
    pub fulfillment_service: FulfillmentService,
    pub customer_service: CustomerService,
    pub sync_service: SyncService,
    pub sync_interval_secs: u64,
    pub bind_addr: String,
}

impl AppState {
    // A assinatura retorna um Result: se a configuração falhar, o main decide.
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL deve ser definida");
        let market_base_url = env::var("MARKET_API_BASE_URL")
            .unwrap_or_else(|_| "https://api.partner.market.yandex.ru".to_string());
        let sync_interval_secs = env::var("SYNC_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(300);
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        let market: Arc<dyn MarketApi> = Arc::new(HttpMarketApi::new(market_base_url)?);

        // --- Monta o gráfico de dependências ---
        let product_repo = ProductRepository::new(db_pool.clone());
        let order_repo = OrderRepository::new(db_pool.clone());
        let code_repo = CodeRepository::new(db_pool.clone());
        let template_repo = TemplateRepository::new(db_pool.clone());
        let settings_repo = SettingsRepository::new(db_pool.clone());
        let customer_repo = CustomerRepository::new(db_pool.clone());

        let catalog_service = CatalogService::new(product_repo.clone(), db_pool.clone());
        let order_service =
            OrderService::new(order_repo.clone(), product_repo.clone(), db_pool.clone());
        let fulfillment_service = FulfillmentService::new(
            order_repo.clone(),
            product_repo.clone(),
            code_repo.clone(),
            template_repo.clone(),
            settings_repo.clone(),
            order_service.clone(),
            market.clone(),
            db_pool.clone(),
        );
        let customer_service = CustomerService::new(customer_repo, db_pool.clone());
        let sync_service = SyncService::new(
            settings_repo.clone(),
            catalog_service.clone(),
            order_service.clone(),
            fulfillment_service.clone(),
            customer_service.clone(),
            market,
            db_pool.clone(),
        );

        Ok(Self {
            db_pool,
            settings_repo,
            template_repo,
            code_repo,
            catalog_service,
            order_service,
            fulfillment_service,
            customer_service,
            sync_service,
            sync_interval_secs,
            bind_addr,
        })
    }
}
