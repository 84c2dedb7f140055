use async_trait::async_trait;
use image::RgbImage;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

use crate::adapters::onnx::{model_catalog::OnnxModelCatalog, render, report, yolo_engine::OnnxYoloEngine};
use crate::application::ports::PredictorPort;
use crate::domain::{
    artifact::csv_side_files,
    detection::{non_max_suppression, Detection},
    errors::{DomainError, DomainResult},
    model::{InferenceOptions, PredictionOutcome, PredictionRequest},
};

/// Predictor integrado: detección YOLO sobre ONNX Runtime.
///
/// Escribe la imagen anotada en la ruta pedida y los CSV `<stem>_info.csv` /
/// `<stem>_info2.csv` en el directorio de CSV.
pub struct OnnxPredictor {
    catalog: OnnxModelCatalog,
    labels: Arc<Vec<String>>,
    engines: Arc<Mutex<HashMap<PathBuf, OnnxYoloEngine>>>,
    csv_dir: PathBuf,
    input_size: u32,
    max_detections: usize,
}

impl OnnxPredictor {
    pub fn new(catalog: OnnxModelCatalog, csv_dir: impl Into<PathBuf>, input_size: u32, max_detections: usize) -> Self {
        let labels = Arc::new(catalog.labels());
        Self {
            catalog,
            labels,
            engines: Arc::new(Mutex::new(HashMap::new())),
            csv_dir: csv_dir.into(),
            input_size,
            max_detections,
        }
    }

    fn models_for(&self, options: &InferenceOptions) -> DomainResult<Vec<PathBuf>> {
        if options.ensemble {
            self.catalog.list_models()
        } else {
            Ok(vec![self.catalog.resolve(&options.model_name)?])
        }
    }
}

/// Lo necesario para correr la predicción en el pool bloqueante.
struct Job {
    request: PredictionRequest,
    models: Vec<PathBuf>,
    labels: Arc<Vec<String>>,
    engines: Arc<Mutex<HashMap<PathBuf, OnnxYoloEngine>>>,
    csv_dir: PathBuf,
    input_size: u32,
    max_detections: usize,
}

impl Job {
    fn run(self) -> DomainResult<PredictionOutcome> {
        let engines = self.engines.clone();
        let labels = self.labels.clone();
        let input_size = self.input_size;

        // Un panic en otra inferencia no invalida las sesiones ya cargadas
        let mut cache = engines.lock().unwrap_or_else(PoisonError::into_inner);
        self.run_with(move |model, rgb, min_conf| {
            engine_for(&mut cache, model)?
                .infer(rgb, input_size, min_conf, &labels)
                .map_err(|e| DomainError::OperationFailed(format!("inferencia: {e:#}")))
        })
    }

    /// Pipeline completo con `detect(modelo, imagen, min_conf)` como fuente de candidatos.
    fn run_with<F>(self, detect: F) -> DomainResult<PredictionOutcome>
    where
        F: FnMut(&Path, &RgbImage, f32) -> DomainResult<Vec<Detection>>,
    {
        let opts = &self.request.options;
        let img = image::open(&self.request.input_path)
            .map_err(|e| DomainError::Decode(format!("{}: {e}", self.request.input_path.display())))?;
        let rgb = img.to_rgb8();

        let candidates = collect_candidates(&self.models, &rgb, opts.tta, opts.min_conf, detect)?;
        let detections = merge(candidates, opts.min_iou, self.max_detections);
        debug!("{} detecciones tras NMS", detections.len());

        let mut annotated = rgb;
        render::draw_detections(&mut annotated, &detections, opts.enhance_labels);
        save_image(&annotated, &self.request.output_path)?;

        let (info_csv, counts_csv) = csv_side_files(&self.csv_dir, &self.request.output_path);
        report::write_reports(&detections, &info_csv, &counts_csv)?;

        Ok(PredictionOutcome {
            output_path: self.request.output_path,
            output_type: "image".to_string(),
        })
    }
}

/// Candidatos de cada modelo; con TTA también de la imagen volteada, devueltos a coordenadas originales.
/// `detect` se consume aquí, y con él el lock de sesiones.
fn collect_candidates<F>(models: &[PathBuf], rgb: &RgbImage, tta: bool, min_conf: f32, mut detect: F) -> DomainResult<Vec<Detection>>
where
    F: FnMut(&Path, &RgbImage, f32) -> DomainResult<Vec<Detection>>,
{
    let flipped = tta.then(|| image::imageops::flip_horizontal(rgb));
    let width = rgb.width() as f32;

    let mut candidates = Vec::new();
    for model in models {
        candidates.extend(detect(model, rgb, min_conf)?);
        if let Some(flipped) = &flipped {
            let mirrored = detect(model, flipped, min_conf)?;
            candidates.extend(mirrored.into_iter().map(|d| d.mirrored(width)));
        }
    }
    Ok(candidates)
}

fn engine_for<'a>(
    engines: &'a mut HashMap<PathBuf, OnnxYoloEngine>,
    model: &Path,
) -> DomainResult<&'a mut OnnxYoloEngine> {
    if !engines.contains_key(model) {
        let engine = OnnxYoloEngine::load(model)
            .map_err(|e| DomainError::OperationFailed(format!("Error cargando modelo {}: {e:#}", model.display())))?;
        engines.insert(model.to_path_buf(), engine);
    }
    engines
        .get_mut(model)
        .ok_or_else(|| DomainError::OperationFailed(format!("sesión perdida para {}", model.display())))
}

/// Une candidatos de varios modelos/aumentos: NMS por clase y tope de detecciones.
fn merge(candidates: Vec<Detection>, min_iou: f32, max_detections: usize) -> Vec<Detection> {
    let mut kept = non_max_suppression(candidates, min_iou);
    kept.truncate(max_detections);
    kept
}

fn save_image(img: &image::RgbImage, path: &Path) -> DomainResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    img.save(path)
        .map_err(|e| DomainError::OperationFailed(format!("no se pudo guardar {}: {e}", path.display())))
}

#[async_trait]
impl PredictorPort for OnnxPredictor {
    async fn predict(&self, request: PredictionRequest) -> DomainResult<PredictionOutcome> {
        if request.options.segmentation {
            return Err(DomainError::InvalidInput(
                "el backend onnx solo hace detección; la segmentación requiere --predictor command".into(),
            ));
        }

        let models = self.models_for(&request.options)?;
        info!(
            "🔍 Inferencia onnx: {} modelo(s), tta={}, umbrales conf={} iou={}",
            models.len(),
            request.options.tta,
            request.options.min_conf,
            request.options.min_iou
        );

        let job = Job {
            request,
            models,
            labels: self.labels.clone(),
            engines: self.engines.clone(),
            csv_dir: self.csv_dir.clone(),
            input_size: self.input_size,
            max_detections: self.max_detections,
        };

        tokio::task::spawn_blocking(move || job.run())
            .await
            .map_err(|e| DomainError::OperationFailed(e.to_string()))?
    }
}
