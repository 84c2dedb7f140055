use async_trait::async_trait;

use crate::domain::{
    errors::DomainResult,
    model::{PredictionOutcome, PredictionRequest},
};

/// Función de predicción (detección/segmentación). Caja negra para el resto del sistema.
#[async_trait]
pub trait PredictorPort: Send + Sync {
    async fn predict(&self, request: PredictionRequest) -> DomainResult<PredictionOutcome>;
}

/// Descarga de medios remotos.
#[async_trait]
pub trait MediaFetcherPort: Send + Sync {
    async fn fetch(&self, url: &url::Url) -> DomainResult<Vec<u8>>;
}
