use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use crate::{
    application::ports::{MediaFetcherPort, PredictorPort},
    config::StorageLayout,
    domain::{
        artifact::{content_addressed_name, csv_side_files, timestamp_name, SourceKind, StoredArtifact},
        errors::{DomainError, DomainResult},
        media::{classify, sanitize_filename, MediaKind},
        model::{InferenceOptions, PredictionRequest},
    },
};

static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Adquisición de entradas: subida, descarga por URL y captura de webcam.
/// Todo lo que se guarda termina en el directorio de uploads.
#[derive(Clone)]
pub struct AcquisitionService {
    layout: StorageLayout,
    fetcher: Arc<dyn MediaFetcherPort>,
}

impl AcquisitionService {
    pub fn new(layout: StorageLayout, fetcher: Arc<dyn MediaFetcherPort>) -> Self {
        Self { layout, fetcher }
    }

    /// Guarda un archivo subido como `<sha256><ext>`.
    /// Solo se aceptan imágenes; el resto se rechaza sin escribir nada.
    pub async fn store_upload(&self, original_name: &str, bytes: Vec<u8>) -> DomainResult<StoredArtifact> {
        let clean = sanitize_filename(original_name);
        let kind = classify(&clean);
        if kind != MediaKind::Image {
            return Err(DomainError::UnsupportedMedia { filename: clean, kind });
        }

        let bytes = decode_check(bytes).await?;
        let filename = content_addressed_name(&bytes, &clean);
        let path = self.write_cached(&filename, &bytes).await?;

        info!("📥 Upload {} guardado como {}", clean, filename);
        Ok(StoredArtifact { filename, path, kind, source: SourceKind::Upload })
    }

    /// Descarga la URL y la guarda con nombre direccionado por contenido.
    /// La clasificación sale de la extensión del último segmento de la ruta.
    pub async fn store_from_url(&self, raw_url: &str) -> DomainResult<StoredArtifact> {
        let url = url::Url::parse(raw_url.trim())
            .map_err(|e| DomainError::InvalidInput(format!("URL inválida {raw_url:?}: {e}")))?;

        let bytes = self.fetcher.fetch(&url).await?;
        let original_name = url
            .path_segments()
            .and_then(|segs| segs.last())
            .unwrap_or_default()
            .to_string();

        let filename = content_addressed_name(&bytes, &original_name);
        let kind = classify(&filename);
        let path = self.write_cached(&filename, &bytes).await?;

        info!("🌐 {} descargado ({} bytes) como {}", url, bytes.len(), filename);
        Ok(StoredArtifact { filename, path, kind, source: SourceKind::Url })
    }

    /// Decodifica la captura de la webcam y la guarda como PNG con nombre de fecha/hora.
    /// Dos capturas en el mismo segundo se sobrescriben.
    pub async fn store_webcam(&self, bytes: Vec<u8>) -> DomainResult<StoredArtifact> {
        let filename = timestamp_name(chrono::Local::now());
        let path = self.layout.uploads.join(&filename);

        let target = path.clone();
        tokio::task::spawn_blocking(move || -> DomainResult<()> {
            let img = image::load_from_memory(&bytes).map_err(|e| DomainError::Decode(e.to_string()))?;
            img.save_with_format(&target, image::ImageFormat::Png)
                .map_err(|e| DomainError::OperationFailed(format!("no se pudo guardar {}: {e}", target.display())))
        })
        .await
        .map_err(|e| DomainError::OperationFailed(e.to_string()))??;

        info!("📷 Captura de webcam guardada como {}", filename);
        Ok(StoredArtifact { filename, path, kind: MediaKind::Image, source: SourceKind::Webcam })
    }

    /// Escribe en uploads vía archivo temporal + rename, así nunca queda a medias
    /// un `<sha256><ext>`. Si ya existía se reemplaza igualmente.
    async fn write_cached(&self, filename: &str, bytes: &[u8]) -> DomainResult<PathBuf> {
        let path = self.layout.uploads.join(filename);
        if tokio::fs::try_exists(&path).await? {
            debug!("Reescribiendo {}", filename);
        }

        let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
        let tmp = self.layout.uploads.join(format!(".{filename}.{}-{seq}.part", std::process::id()));
        if let Err(e) = tokio::fs::write(&tmp, bytes).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        tokio::fs::rename(&tmp, &path).await?;
        Ok(path)
    }
}

/// Comprueba que los bytes se decodifican como imagen y los devuelve intactos.
async fn decode_check(bytes: Vec<u8>) -> DomainResult<Vec<u8>> {
    tokio::task::spawn_blocking(move || {
        image::load_from_memory(&bytes)
            .map(|_| bytes)
            .map_err(|e| DomainError::Decode(e.to_string()))
    })
    .await
    .map_err(|e| DomainError::OperationFailed(e.to_string()))?
}

/// Resultado del análisis listo para cualquiera de los dos adaptadores HTTP.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub input: StoredArtifact,
    pub filename: String,
    pub output_path: PathBuf,
    pub output_type: String,
    pub csv_info: PathBuf,
    pub csv_counts: PathBuf,
}

/// Orquesta el filtro de formato y la llamada al predictor.
#[derive(Clone)]
pub struct AnalysisService {
    layout: StorageLayout,
    predictor: Arc<dyn PredictorPort>,
}

impl AnalysisService {
    pub fn new(layout: StorageLayout, predictor: Arc<dyn PredictorPort>) -> Self {
        Self { layout, predictor }
    }

    pub async fn analyze(&self, input: StoredArtifact, options: InferenceOptions) -> DomainResult<AnalysisReport> {
        // Solo las imágenes llegan al predictor
        if input.kind != MediaKind::Image {
            return Err(DomainError::UnsupportedMedia { filename: input.filename, kind: input.kind });
        }

        let output_path = self.layout.output_path(&input.filename, options.segmentation);
        debug!(?options, "Despachando {} -> {}", input.path.display(), output_path.display());

        let started = std::time::Instant::now();
        let outcome = self
            .predictor
            .predict(PredictionRequest {
                input_path: input.path.clone(),
                output_path,
                options,
            })
            .await?;
        info!(
            "✅ Predicción {} en {:.1} ms ({})",
            outcome.output_path.display(),
            started.elapsed().as_secs_f32() * 1000.0,
            outcome.output_type
        );

        let filename = outcome
            .output_path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();
        let (csv_info, csv_counts) = csv_side_files(&self.layout.csv, &outcome.output_path);

        Ok(AnalysisReport {
            input,
            filename,
            output_path: outcome.output_path,
            output_type: outcome.output_type,
            csv_info,
            csv_counts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::PredictionOutcome;
    use async_trait::async_trait;
    use sha2::{Digest, Sha256};
    use std::io::Cursor;
    use std::sync::Mutex;

    struct EchoPredictor {
        seen: Mutex<Vec<PredictionRequest>>,
    }

    #[async_trait]
    impl PredictorPort for EchoPredictor {
        async fn predict(&self, request: PredictionRequest) -> DomainResult<PredictionOutcome> {
            let output_path = request.output_path.clone();
            self.seen.lock().unwrap().push(request);
            Ok(PredictionOutcome { output_path, output_type: "image".into() })
        }
    }

    struct StaticFetcher(Vec<u8>);

    #[async_trait]
    impl MediaFetcherPort for StaticFetcher {
        async fn fetch(&self, _url: &url::Url) -> DomainResult<Vec<u8>> {
            Ok(self.0.clone())
        }
    }

    fn png_bytes() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(4, 3, image::Rgb([10, 200, 30]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    async fn layout() -> (tempfile::TempDir, StorageLayout) {
        let dir = tempfile::tempdir().unwrap();
        let layout = StorageLayout::under(dir.path().join("static"));
        layout.ensure().await.unwrap();
        (dir, layout)
    }

    #[tokio::test]
    async fn upload_is_stored_under_its_content_hash() {
        let (_dir, layout) = layout().await;
        let svc = AcquisitionService::new(layout.clone(), Arc::new(StaticFetcher(Vec::new())));
        let bytes = png_bytes();

        let first = svc.store_upload("photo.jpg", bytes.clone()).await.unwrap();
        let expected = format!("{:x}.jpg", Sha256::digest(&bytes));
        assert_eq!(first.filename, expected);
        assert_eq!(first.path, layout.uploads.join(&expected));
        assert_eq!(std::fs::read(&first.path).unwrap(), bytes);

        let second = svc.store_upload("other-name.jpg", bytes).await.unwrap();
        assert_eq!(second.path, first.path);
    }

    #[tokio::test]
    async fn truncated_cached_file_is_replaced() {
        let (_dir, layout) = layout().await;
        let svc = AcquisitionService::new(layout.clone(), Arc::new(StaticFetcher(Vec::new())));
        let bytes = png_bytes();
        let hashed = layout.uploads.join(format!("{:x}.png", Sha256::digest(&bytes)));
        std::fs::write(&hashed, &bytes[..10]).unwrap();

        let stored = svc.store_upload("photo.png", bytes.clone()).await.unwrap();
        assert_eq!(stored.path, hashed);
        assert_eq!(std::fs::read(&hashed).unwrap(), bytes);
        assert!(image::open(&hashed).is_ok());
        // Sin restos de archivos temporales
        assert_eq!(std::fs::read_dir(&layout.uploads).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn non_image_upload_writes_nothing() {
        let (_dir, layout) = layout().await;
        let svc = AcquisitionService::new(layout.clone(), Arc::new(StaticFetcher(Vec::new())));

        let err = svc.store_upload("notes.txt", b"hello".to_vec()).await.unwrap_err();
        assert!(matches!(err, DomainError::UnsupportedMedia { kind: MediaKind::Invalid, .. }));
        let err = svc.store_upload("clip.mp4", b"hello".to_vec()).await.unwrap_err();
        assert!(matches!(err, DomainError::UnsupportedMedia { kind: MediaKind::Video, .. }));
        assert_eq!(std::fs::read_dir(&layout.uploads).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn undecodable_upload_is_a_decode_error() {
        let (_dir, layout) = layout().await;
        let svc = AcquisitionService::new(layout, Arc::new(StaticFetcher(Vec::new())));
        let err = svc.store_upload("photo.png", b"not an image".to_vec()).await.unwrap_err();
        assert!(matches!(err, DomainError::Decode(_)));
    }

    #[tokio::test]
    async fn url_download_uses_last_path_segment_extension() {
        let (_dir, layout) = layout().await;
        let bytes = png_bytes();
        let svc = AcquisitionService::new(layout.clone(), Arc::new(StaticFetcher(bytes.clone())));

        let stored = svc.store_from_url("https://example.com/img/dish.PNG?size=large").await.unwrap();
        assert_eq!(stored.filename, format!("{:x}.PNG", Sha256::digest(&bytes)));
        assert_eq!(stored.kind, MediaKind::Image);
        assert_eq!(stored.source, SourceKind::Url);
        assert!(stored.path.exists());

        assert!(matches!(
            svc.store_from_url("not a url").await,
            Err(DomainError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn webcam_capture_is_saved_as_png() {
        let (_dir, layout) = layout().await;
        let svc = AcquisitionService::new(layout, Arc::new(StaticFetcher(Vec::new())));

        let stored = svc.store_webcam(png_bytes()).await.unwrap();
        assert!(stored.filename.ends_with(".png"));
        assert_eq!(stored.filename.len(), "YYYYMMDD-HHMMSS.png".len());
        assert_eq!(image::open(&stored.path).unwrap().width(), 4);

        assert!(matches!(svc.store_webcam(b"garbage".to_vec()).await, Err(DomainError::Decode(_))));
    }

    #[tokio::test]
    async fn segmentation_routes_output_to_its_directory() {
        let (_dir, layout) = layout().await;
        let predictor = Arc::new(EchoPredictor { seen: Mutex::new(Vec::new()) });
        let svc = AnalysisService::new(layout.clone(), predictor.clone());
        let input = StoredArtifact {
            filename: "abc.jpg".into(),
            path: layout.uploads.join("abc.jpg"),
            kind: MediaKind::Image,
            source: SourceKind::Upload,
        };

        let det = svc.analyze(input.clone(), InferenceOptions::default()).await.unwrap();
        assert_eq!(det.output_path, layout.detections.join("abc.jpg"));

        let seg_opts = InferenceOptions { segmentation: true, ..Default::default() };
        let seg = svc.analyze(input, seg_opts).await.unwrap();
        assert_eq!(seg.output_path, layout.segmentations.join("abc.jpg"));
        assert_eq!(seg.filename, "abc.jpg");
        assert_eq!(seg.csv_info, layout.csv.join("abc_info.csv"));
        assert_eq!(seg.csv_counts, layout.csv.join("abc_info2.csv"));
        assert_eq!(predictor.seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn videos_are_not_dispatched() {
        let (_dir, layout) = layout().await;
        let predictor = Arc::new(EchoPredictor { seen: Mutex::new(Vec::new()) });
        let svc = AnalysisService::new(layout.clone(), predictor.clone());
        let input = StoredArtifact {
            filename: "abc.mp4".into(),
            path: layout.uploads.join("abc.mp4"),
            kind: MediaKind::Video,
            source: SourceKind::Url,
        };

        let err = svc.analyze(input, InferenceOptions::default()).await.unwrap_err();
        assert!(matches!(err, DomainError::UnsupportedMedia { kind: MediaKind::Video, .. }));
        assert!(predictor.seen.lock().unwrap().is_empty());
    }
}
