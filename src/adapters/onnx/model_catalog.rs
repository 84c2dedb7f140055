use std::path::{Path, PathBuf};

use crate::domain::errors::{DomainError, DomainResult};

/// Nombres COCO usados cuando el directorio de modelos no trae `labels.txt`.
pub const COCO_CLASSES: [&str; 80] = [
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck", "boat",
    "traffic light", "fire hydrant", "stop sign", "parking meter", "bench", "bird", "cat", "dog",
    "horse", "sheep", "cow", "elephant", "bear", "zebra", "giraffe", "backpack", "umbrella",
    "handbag", "tie", "suitcase", "frisbee", "skis", "snowboard", "sports ball", "kite",
    "baseball bat", "baseball glove", "skateboard", "surfboard", "tennis racket", "bottle",
    "wine glass", "cup", "fork", "knife", "spoon", "bowl", "banana", "apple", "sandwich", "orange",
    "broccoli", "carrot", "hot dog", "pizza", "donut", "cake", "chair", "couch", "potted plant",
    "bed", "dining table", "toilet", "tv", "laptop", "mouse", "remote", "keyboard", "cell phone",
    "microwave", "oven", "toaster", "sink", "refrigerator", "book", "clock", "vase", "scissors",
    "teddy bear", "hair drier", "toothbrush",
];

/// Resuelve nombres lógicos de modelo a archivos `.onnx` dentro de un directorio.
#[derive(Debug, Clone)]
pub struct OnnxModelCatalog {
    models_dir: PathBuf,
}

impl OnnxModelCatalog {
    pub fn new(models_dir: impl Into<PathBuf>) -> Self {
        Self { models_dir: models_dir.into() }
    }

    /// `<models_dir>/<nombre>.onnx`; el nombre no puede salir del directorio.
    pub fn resolve(&self, model_name: &str) -> DomainResult<PathBuf> {
        let name = model_name.trim();
        if name.is_empty() {
            return Err(DomainError::InvalidInput("nombre de modelo vacío".into()));
        }
        if name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(DomainError::InvalidInput(format!("nombre de modelo inválido: {name}")));
        }

        let path = self.models_dir.join(format!("{name}.onnx"));
        if !path.is_file() {
            return Err(DomainError::NotFound(format!("model file not found: {}", path.display())));
        }
        Ok(path)
    }

    /// Todos los `.onnx` del directorio, en orden alfabético (para ensembles).
    pub fn list_models(&self) -> DomainResult<Vec<PathBuf>> {
        let mut models: Vec<PathBuf> = std::fs::read_dir(&self.models_dir)
            .map_err(|e| DomainError::NotFound(format!("{}: {e}", self.models_dir.display())))?
            .flatten()
            .map(|entry| entry.path())
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "onnx"))
            .collect();
        models.sort();

        if models.is_empty() {
            return Err(DomainError::NotFound(format!(
                "no hay modelos .onnx en {}",
                self.models_dir.display()
            )));
        }
        Ok(models)
    }

    /// Etiquetas de clase: una por línea en `labels.txt`, o COCO si no existe.
    pub fn labels(&self) -> Vec<String> {
        load_labels(&self.models_dir.join("labels.txt"))
            .unwrap_or_else(|| COCO_CLASSES.iter().map(|s| s.to_string()).collect())
    }
}

fn load_labels(path: &Path) -> Option<Vec<String>> {
    let text = std::fs::read_to_string(path).ok()?;
    let labels: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_owned)
        .collect();
    (!labels.is_empty()).then_some(labels)
}
