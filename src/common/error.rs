// src/common/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::models::order::OrderStatus;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
// Todos os erros visíveis ao cliente viram JSON estruturado via IntoResponse,
// para que a UI consiga renderizar mensagens distintas por tipo.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Pedido não encontrado")]
    OrderNotFound,

    #[error("Restaurante não encontrado")]
    RestaurantNotFound,

    #[error("Item de cardápio não encontrado: {0}")]
    MenuItemNotFound(String),

    // Transição de status recusada pela máquina de estados do pedido.
    // Carrega origem e destino para a mensagem ser precisa.
    #[error("Transição de status inválida: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    // O ator não tem permissão. Não revelamos se o recurso existe.
    #[error("Ação não autorizada")]
    Unauthorized,

    // Outro staff venceu a corrida pelo claim do pedido.
    #[error("Pedido já atribuído a outro membro do staff")]
    OrderAlreadyClaimed,

    #[error("Fluxo de atribuição desativado para este restaurante")]
    WorkflowDisabled,

    // Colisão interna de número de pedido (corrida count-then-insert).
    // O service faz retry; só vaza como OrderNumberExhausted.
    #[error("Conflito na alocação do número de pedido")]
    AllocationConflict,

    // A alocação de número de pedido esgotou as tentativas de retry.
    // Nunca vaza o conflito de chave; degrada para falha transitória.
    #[error("Não foi possível alocar um número de pedido")]
    OrderNumberExhausted,

    // Variante para erros de banco de dados (sqlx)
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    // `anyhow::Error` é ótimo para capturar o contexto do erro.
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // Retorna todos os detalhes da validação, campo a campo.
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

            // A máquina de estados devolve origem e destino juntos.
            AppError::InvalidTransition { from, to } => {
                let body = Json(json!({
                    "error": format!("Transição de status inválida de '{}' para '{}'.", from, to),
                    "from": from,
                    "to": to,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }

            AppError::EmailAlreadyExists => {
                (StatusCode::CONFLICT, "Este e-mail já está em uso.".to_string())
            }
            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "E-mail ou senha inválidos.".to_string())
            }
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "Token de autenticação inválido ou ausente.".to_string(),
            ),
            AppError::UserNotFound => {
                (StatusCode::NOT_FOUND, "Usuário não encontrado.".to_string())
            }
            AppError::OrderNotFound => {
                (StatusCode::NOT_FOUND, "Pedido não encontrado.".to_string())
            }
            AppError::RestaurantNotFound => {
                (StatusCode::NOT_FOUND, "Restaurante não encontrado.".to_string())
            }
            AppError::MenuItemNotFound(ref id) => (
                StatusCode::NOT_FOUND,
                format!("Item de cardápio '{}' não encontrado.", id),
            ),
            AppError::Unauthorized => (
                StatusCode::FORBIDDEN,
                "Você não tem permissão para realizar esta ação.".to_string(),
            ),
            AppError::OrderAlreadyClaimed => (
                StatusCode::CONFLICT,
                "Este pedido já foi atribuído a outro membro do staff.".to_string(),
            ),
            AppError::WorkflowDisabled => (
                StatusCode::FORBIDDEN,
                "O fluxo de atribuição de pedidos está desativado para este restaurante.".to_string(),
            ),
            AppError::OrderNumberExhausted => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Falha temporária ao criar o pedido. Tente novamente.".to_string(),
            ),

            // Todos os outros erros (DatabaseError, InternalServerError) viram 500.
            // O `tracing` loga a mensagem detalhada que o `thiserror` nos deu.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Ocorreu um erro inesperado.".to_string(),
                )
            }
        };

        // Resposta padrão para erros simples que só têm uma mensagem.
        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
