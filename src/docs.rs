// src/docs.rs

use utoipa::OpenApi;

use crate::handlers;
use crate::models;
use crate::services;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Catálogo ---
        handlers::products::list_products,
        handlers::products::get_product,
        handlers::products::update_product,

        // --- Códigos de Ativação ---
        handlers::codes::upload_codes,
        handlers::codes::available_codes,

        // --- Pedidos ---
        handlers::orders::list_orders,
        handlers::orders::get_order_group,
        handlers::orders::complete_order,
        handlers::orders::finish_order,

        // --- Templates ---
        handlers::templates::list_templates,
        handlers::templates::create_template,
        handlers::templates::update_template,

        // --- Configurações ---
        handlers::settings::get_settings,
        handlers::settings::update_settings,

        // --- Clientes ---
        handlers::customers::list_customers,

        // --- Sincronização ---
        handlers::sync::trigger_sync,
        handlers::sync::market_webhook,
    ),
    components(
        schemas(
            // --- Catálogo ---
            models::product::ProductType,
            models::product::Product,
            handlers::products::UpdateProductPayload,

            // --- Códigos de Ativação ---
            models::code::ActivationCode,
            handlers::codes::UploadCodesPayload,
            handlers::codes::CodeStockResponse,

            // --- Pedidos ---
            models::order::OrderStatus,
            models::order::MarketOrder,
            models::market::DeliveryItem,
            handlers::orders::CompleteOrderPayload,
            services::fulfillment_service::DeliveredLine,
            services::fulfillment_service::FulfillmentReport,

            // --- Templates ---
            models::template::FulfillmentTemplate,
            handlers::templates::CreateTemplatePayload,
            handlers::templates::UpdateTemplatePayload,

            // --- Configurações ---
            models::settings::TenantSettings,
            models::settings::UpdateSettingsRequest,

            // --- Clientes ---
            models::customer::Customer,

            // --- Sincronização ---
            services::catalog_service::CatalogSyncSummary,
            services::sync_service::ReconcileSummary,
            handlers::sync::WebhookResponse,
        )
    ),
    tags(
        (name = "Catálogo", description = "Produtos espelhados do marketplace e edições locais"),
        (name = "Códigos de Ativação", description = "Estoque de códigos de uso único por produto"),
        (name = "Pedidos", description = "Registros locais de pedidos e fulfillment digital"),
        (name = "Templates", description = "Templates de entrega de produtos digitais"),
        (name = "Configurações", description = "Configurações da Loja"),
        (name = "Clientes", description = "Histórico de compras por comprador"),
        (name = "Sincronização", description = "Reconciliação com o marketplace e webhook")
    )
)]
pub struct ApiDoc;
