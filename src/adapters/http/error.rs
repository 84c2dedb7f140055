use axum::http::StatusCode;

use crate::domain::errors::DomainError;

/// Código HTTP para cada error de dominio. Los rechazos del filtro de formato
/// no son errores del servidor: cada adaptador responde con su mensaje y 200.
pub fn status_for(err: &DomainError) -> StatusCode {
    match err {
        DomainError::UnsupportedMedia { .. } => StatusCode::OK,
        DomainError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        DomainError::NotFound(_)
        | DomainError::Fetch { .. }
        | DomainError::Decode(_)
        | DomainError::Storage(_)
        | DomainError::OperationFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
