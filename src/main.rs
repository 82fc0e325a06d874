//src/main.rs

use axum::{
    routing::{get, patch, post},
    Router,
};
use tokio::net::TcpListener;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

// Declaração dos nossos módulos
mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::AppState;

#[tokio::main]
async fn main() {
    // Inicializa o logger.
    tracing_subscriber::fmt().with_target(false).compact().init();

    // Lida com o Result retornado por AppState::new()
    // .expect() é bom aqui: se a configuração falhar, a aplicação não deve iniciar.
    let app_state = AppState::new()
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    // Roda as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Tarefa de fundo: poll periódico do marketplace para todas as lojas
    // habilitadas. Roda para sempre, independente dos handlers.
    tokio::spawn(
        app_state
            .sync_service
            .clone()
            .run_periodic(app_state.sync_interval_secs),
    );

    let product_routes = Router::new()
        .route("/", get(handlers::products::list_products))
        .route(
            "/{id}",
            get(handlers::products::get_product).patch(handlers::products::update_product),
        )
        .route("/{id}/codes", post(handlers::codes::upload_codes))
        .route("/{id}/codes/available", get(handlers::codes::available_codes));

    let order_routes = Router::new()
        .route("/", get(handlers::orders::list_orders))
        .route("/{remote_order_id}", get(handlers::orders::get_order_group))
        .route(
            "/{remote_order_id}/complete",
            post(handlers::orders::complete_order),
        )
        .route(
            "/{remote_order_id}/finish",
            post(handlers::orders::finish_order),
        );

    let template_routes = Router::new()
        .route(
            "/",
            get(handlers::templates::list_templates).post(handlers::templates::create_template),
        )
        .route("/{id}", patch(handlers::templates::update_template));

    // Combina tudo no router principal
    let addr = app_state.bind_addr.clone();
    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/products", product_routes)
        .nest("/api/orders", order_routes)
        .nest("/api/templates", template_routes)
        .route(
            "/api/settings",
            get(handlers::settings::get_settings).put(handlers::settings::update_settings),
        )
        .route("/api/customers", get(handlers::customers::list_customers))
        .route("/api/sync", post(handlers::sync::trigger_sync))
        .route("/api/market/webhook", post(handlers::sync::market_webhook))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", docs::ApiDoc::openapi()))
        .with_state(app_state);

    // Inicia o servidor
    let listener = TcpListener::bind(&addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr().unwrap());
    axum::serve(listener, app)
        .await
        .expect("Erro no servidor Axum");
}
