use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Cabeçalho de loja inválido: {0}")]
    BadTenantHeader(String),

    #[error("Pedido não encontrado: {0}")]
    OrderNotFound(String),

    #[error("Produto não encontrado")]
    ProductNotFound,

    #[error("Template não encontrado")]
    TemplateNotFound,

    #[error("A loja ainda não configurou o acesso ao marketplace")]
    MarketNotConfigured,

    // Falha de validação do fulfillment: produtos digitais sem template.
    // Nenhuma entrega parcial acontece quando isso é detectado.
    #[error("Produtos sem template de entrega: {}", .0.join(", "))]
    MissingTemplates(Vec<String>),

    #[error("Nenhum item entregável neste pedido")]
    NoDeliverableItems,

    #[error("Sem código disponível para o produto '{0}'")]
    NoCodeAvailable(String),

    #[error("Pedido já enviado ao comprador")]
    AlreadySent,

    // Falha de transporte com o marketplace (rede, timeout)
    #[error("Falha de comunicação com o marketplace: {0}")]
    MarketTransport(#[from] reqwest::Error),

    // O marketplace respondeu, mas rejeitou a operação
    #[error("O marketplace rejeitou a operação: {0}")]
    MarketRejected(String),

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // Retorna todos os detalhes da validação.
            AppError::ValidationError(errors) => {
                let mut details = std::collections::HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                let body = Json(json!({
                    "error": "Um ou mais campos são inválidos.",
                    "details": details,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }

            // Falhas estruturadas do fulfillment carregam a lista de produtos.
            AppError::MissingTemplates(ref products) => {
                let body = Json(json!({
                    "error": "Produtos digitais sem template de entrega.",
                    "products": products,
                }));
                return (StatusCode::UNPROCESSABLE_ENTITY, body).into_response();
            }

            AppError::BadTenantHeader(ref msg) => {
                let body = Json(json!({ "error": msg }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }

            AppError::OrderNotFound(ref id) => {
                let body = Json(json!({ "error": format!("Pedido {} não encontrado.", id) }));
                return (StatusCode::NOT_FOUND, body).into_response();
            }

            AppError::ProductNotFound => (StatusCode::NOT_FOUND, "Produto não encontrado."),
            AppError::TemplateNotFound => (StatusCode::NOT_FOUND, "Template não encontrado."),
            AppError::MarketNotConfigured => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Configure o campaign id e o token do marketplace antes de sincronizar.",
            ),
            AppError::NoDeliverableItems => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Nenhum item digital deste pedido pertence a esta loja.",
            ),
            AppError::NoCodeAvailable(ref produto) => {
                let body = Json(json!({
                    "error": format!("Sem código de ativação disponível para '{}'.", produto)
                }));
                return (StatusCode::UNPROCESSABLE_ENTITY, body).into_response();
            }
            AppError::AlreadySent => (
                StatusCode::CONFLICT,
                "Os códigos deste pedido já foram enviados ao comprador.",
            ),

            AppError::MarketRejected(ref msg) => {
                tracing::error!("Marketplace rejeitou a operação: {}", msg);
                let body = Json(json!({ "error": format!("Marketplace: {}", msg) }));
                return (StatusCode::BAD_GATEWAY, body).into_response();
            }
            AppError::MarketTransport(ref e) => {
                tracing::error!("Falha de transporte com o marketplace: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    "Não foi possível falar com o marketplace. Tente novamente.",
                )
            }

            // Todos os outros erros (DatabaseError, InternalServerError) viram 500.
            // O `tracing` vai logar a mensagem detalhada que `thiserror` nos deu.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Ocorreu um erro inesperado.")
            }
        };

        // Resposta padrão para erros simples que só têm uma mensagem.
        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
