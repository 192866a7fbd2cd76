//! Tipos de erro para o cliente da API de recrutamento.
//!
//! Define [`ApiError`] com variantes para autenticação, recursos ausentes,
//! erros HTTP e erros de rede. Usa `thiserror` para derivar `Display` e `Error`
//! automaticamente a partir dos atributos `#[error(...)]`.

use thiserror::Error;

/// Erros que podem ocorrer ao interagir com a API de recrutamento.
///
/// - [`Unauthorized`](ApiError::Unauthorized) — HTTP 401 mesmo após renovar a credencial
/// - [`NotFound`](ApiError::NotFound) — HTTP 404 para um template ou candidato
/// - [`Status`](ApiError::Status) — qualquer outro erro HTTP (4xx/5xx)
/// - [`Network`](ApiError::Network) — falha na camada de rede
#[derive(Debug, Error)]
pub enum ApiError {
    /// A credencial foi rejeitada duas vezes seguidas.
    #[error("unauthorized: bearer token rejected after refresh")]
    Unauthorized,

    /// O recurso solicitado não existe no servidor.
    #[error("{resource} not found")]
    NotFound { resource: String },

    /// Erro retornado pela API (ex.: 422 payload inválido, 500 erro interno).
    #[error("API error (status {status}): {message}")]
    Status { status: u16, message: String },

    /// O corpo da resposta não tem o formato esperado.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// O provedor de credenciais não conseguiu fornecer um token.
    #[error("credentials unavailable: {0}")]
    Credentials(String),

    /// Falha de rede subjacente (DNS, conexão recusada, timeout).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}
