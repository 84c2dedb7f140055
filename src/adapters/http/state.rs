use std::sync::Arc;

use crate::application::services::{AcquisitionService, AnalysisService};
use crate::config::AppConfig;

/// Estado compartido para los manejadores HTTP de Axum.
/// Los dos adaptadores (UI y API) usan los mismos servicios.
#[derive(Clone)]
pub struct HttpState {
    /// Subidas, descargas por URL y capturas de webcam.
    pub acquisition: Arc<AcquisitionService>,
    /// Filtro de formato y despacho al predictor.
    pub analysis: Arc<AnalysisService>,
    pub config: Arc<AppConfig>,
}
