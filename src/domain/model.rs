use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Opciones de inferencia ya normalizadas (umbrales en 0..1, modelo en minúsculas).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceOptions {
    pub min_iou: f32,
    pub min_conf: f32,
    pub model_name: String,
    pub enhance_labels: bool,
    pub ensemble: bool,
    pub tta: bool,
    pub segmentation: bool,
}

impl Default for InferenceOptions {
    fn default() -> Self {
        Self {
            min_iou: 0.45,
            min_conf: 0.25,
            model_name: "yolov8s".to_string(),
            enhance_labels: false,
            ensemble: false,
            tta: false,
            segmentation: false,
        }
    }
}

/// Petición al predictor externo.
#[derive(Debug, Clone)]
pub struct PredictionRequest {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub options: InferenceOptions,
}

/// Lo que devuelve el predictor: dónde quedó el resultado y de qué tipo es.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionOutcome {
    pub output_path: PathBuf,
    pub output_type: String,
}
