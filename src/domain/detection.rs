use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub score: f32,
    pub class_id: usize,
    pub label: String,
}

impl Detection {
    pub fn area(&self) -> f32 {
        (self.x2 - self.x1).max(0.0) * (self.y2 - self.y1).max(0.0)
    }

    /// Refleja la caja horizontalmente dentro de una imagen de ancho `width`.
    pub fn mirrored(mut self, width: f32) -> Self {
        let (x1, x2) = (width - self.x2, width - self.x1);
        self.x1 = x1;
        self.x2 = x2;
        self
    }
}

pub fn iou(a: &Detection, b: &Detection) -> f32 {
    let x1 = a.x1.max(b.x1);
    let y1 = a.y1.max(b.y1);
    let x2 = a.x2.min(b.x2);
    let y2 = a.y2.min(b.y2);

    let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let union = a.area() + b.area() - intersection;

    if union > 0.0 {
        intersection / union
    } else {
        0.0
    }
}

/// Supresión de no máximos por clase. Devuelve las detecciones ordenadas por score descendente.
pub fn non_max_suppression(mut detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    detections.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut kept: Vec<Detection> = Vec::with_capacity(detections.len());
    for det in detections {
        let suppressed = kept
            .iter()
            .any(|k| k.class_id == det.class_id && iou(k, &det) >= iou_threshold);
        if !suppressed {
            kept.push(det);
        }
    }
    kept
}

/// Conteo de detecciones por etiqueta, en orden alfabético.
pub fn count_by_label(detections: &[Detection]) -> BTreeMap<&str, usize> {
    let mut counts = BTreeMap::new();
    for det in detections {
        *counts.entry(det.label.as_str()).or_insert(0) += 1;
    }
    counts
}
