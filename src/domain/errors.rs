use thiserror::Error;

use super::media::MediaKind;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("No encontrado: {0}")]
    NotFound(String),
    #[error("Entrada inválida: {0}")]
    InvalidInput(String),
    #[error("Tipo de archivo no soportado ({kind}): {filename}")]
    UnsupportedMedia { filename: String, kind: MediaKind },
    #[error("Error descargando {url}: {reason}")]
    Fetch { url: String, reason: String },
    #[error("Error decodificando imagen: {0}")]
    Decode(String),
    #[error("Error de almacenamiento: {0}")]
    Storage(#[from] std::io::Error),
    #[error("Error de operación: {0}")]
    OperationFailed(String),
}

pub type DomainResult<T> = Result<T, DomainError>;
