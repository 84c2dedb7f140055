use serde::{Deserialize, Serialize};

use crate::domain::{
    errors::{DomainError, DomainResult},
    media::IMAGE_EXTENSIONS,
    model::InferenceOptions,
};

pub const NO_FILE_MESSAGE: &str = "No file uploaded";
pub const INVALID_INPUT_MESSAGE: &str = "Invalid input url!!!";

pub fn invalid_format_message() -> String {
    format!("Invalid file format. Allowed file types: {}", IMAGE_EXTENSIONS.join(", "))
}

/// Campos de opciones tal y como llegan en el formulario.
#[derive(Debug, Clone, Default)]
pub struct AnalyzeOptionsForm {
    pub threshold_range: Option<String>,
    pub confidence_range: Option<String>,
    pub model_types: Option<String>,
    pub enhanced: Option<String>,
    pub ensemble: Option<String>,
    pub tta: Option<String>,
    pub seg: Option<String>,
}

impl AnalyzeOptionsForm {
    /// Construye el formulario consultando cada campo por su nombre HTML.
    pub fn from_lookup<'a>(lookup: impl Fn(&str) -> Option<&'a str>) -> Self {
        let get = |name: &str| lookup(name).map(str::to_owned);
        Self {
            threshold_range: get("threshold-range"),
            confidence_range: get("confidence-range"),
            model_types: get("model-types"),
            enhanced: get("enhanced"),
            ensemble: get("ensemble"),
            tta: get("tta"),
            seg: get("seg"),
        }
    }
}

fn percent(field: &str, raw: Option<&str>) -> DomainResult<f32> {
    let raw = raw.ok_or_else(|| DomainError::InvalidInput(format!("falta el campo {field}")))?;
    let value: f32 = raw
        .trim()
        .parse()
        .map_err(|_| DomainError::InvalidInput(format!("{field} no es numérico: {raw:?}")))?;
    if !(0.0..=100.0).contains(&value) {
        return Err(DomainError::InvalidInput(format!("{field} fuera de 0..100: {value}")));
    }
    Ok(value / 100.0)
}

fn checkbox(raw: Option<&str>) -> bool {
    raw == Some("on")
}

impl TryFrom<AnalyzeOptionsForm> for InferenceOptions {
    type Error = DomainError;

    fn try_from(f: AnalyzeOptionsForm) -> DomainResult<Self> {
        let model_name = f
            .model_types
            .as_deref()
            .map(str::to_lowercase)
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| DomainError::InvalidInput("falta el campo model-types".into()))?;

        Ok(InferenceOptions {
            min_iou: percent("threshold-range", f.threshold_range.as_deref())?,
            min_conf: percent("confidence-range", f.confidence_range.as_deref())?,
            model_name,
            enhance_labels: checkbox(f.enhanced.as_deref()),
            ensemble: checkbox(f.ensemble.as_deref()),
            tta: checkbox(f.tta.as_deref()),
            segmentation: checkbox(f.seg.as_deref()),
        })
    }
}

/// Respuesta de la API JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub filename: String,
    pub csv_name1: String,
    pub csv_name2: String,
    pub output_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}
