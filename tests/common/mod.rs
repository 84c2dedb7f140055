#![allow(dead_code)]

use async_trait::async_trait;
use axum::{body::Body, http::Request, Router};
use http_body_util::BodyExt;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use yolo_media_web::{
    adapters::http::{router, state::HttpState},
    application::{
        ports::{MediaFetcherPort, PredictorPort},
        services::{AcquisitionService, AnalysisService},
    },
    config::{AppConfig, AppKind, PredictorConfig, StorageLayout},
    domain::{
        errors::{DomainError, DomainResult},
        model::{PredictionOutcome, PredictionRequest},
    },
};

pub const BOUNDARY: &str = "XtestBoundary7MA4YWxk";

/// Predictor falso: copia la entrada al destino y recuerda cada petición.
#[derive(Default)]
pub struct CopyPredictor {
    pub requests: Mutex<Vec<PredictionRequest>>,
}

#[async_trait]
impl PredictorPort for CopyPredictor {
    async fn predict(&self, request: PredictionRequest) -> DomainResult<PredictionOutcome> {
        std::fs::copy(&request.input_path, &request.output_path)?;
        let output_path = request.output_path.clone();
        self.requests.lock().unwrap().push(request);
        Ok(PredictionOutcome { output_path, output_type: "image".into() })
    }
}

/// Descargador falso: devuelve siempre los mismos bytes, o falla si no hay.
pub struct FixedFetcher(pub Option<Vec<u8>>);

#[async_trait]
impl MediaFetcherPort for FixedFetcher {
    async fn fetch(&self, url: &url::Url) -> DomainResult<Vec<u8>> {
        self.0.clone().ok_or_else(|| DomainError::Fetch {
            url: url.to_string(),
            reason: "connection refused".into(),
        })
    }
}

pub struct TestApp {
    pub _dir: tempfile::TempDir,
    pub layout: StorageLayout,
    pub predictor: Arc<CopyPredictor>,
    pub router: Router,
}

/// Configuración de prueba; el predictor configurado no se usa porque se inyecta `CopyPredictor`.
pub fn config(kind: AppKind, static_dir: PathBuf) -> AppConfig {
    AppConfig {
        app: kind,
        bind_addr: "127.0.0.1:0".to_string(),
        layout: StorageLayout::under(static_dir),
        predictor: PredictorConfig::Command { program: "true".to_string(), args: Vec::new() },
        max_upload_bytes: 16 * 1024 * 1024,
    }
}

pub async fn app(kind: AppKind, fetched: Option<Vec<u8>>) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let config = Arc::new(config(kind, dir.path().join("static")));
    config.layout.ensure().await.unwrap();

    let predictor = Arc::new(CopyPredictor::default());
    let state = HttpState {
        acquisition: Arc::new(AcquisitionService::new(config.layout.clone(), Arc::new(FixedFetcher(fetched)))),
        analysis: Arc::new(AnalysisService::new(config.layout.clone(), predictor.clone())),
        config: config.clone(),
    };

    TestApp { _dir: dir, layout: config.layout.clone(), predictor, router: router(state) }
}

pub enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes());
                body.extend_from_slice(value.as_bytes());
            }
            Part::File(name, filename, bytes) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn options<'a>() -> Vec<Part<'a>> {
    vec![
        Part::Text("threshold-range", "45"),
        Part::Text("confidence-range", "75"),
        Part::Text("model-types", "YOLOv8s"),
    ]
}

pub async fn post_form(router: &Router, parts: &[Part<'_>]) -> (u16, String) {
    let req = Request::post("/analyze")
        .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(multipart_body(parts)))
        .unwrap();
    send(router, req).await
}

pub async fn get(router: &Router, uri: &str) -> (u16, String) {
    send(router, Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn send(router: &Router, req: Request<Body>) -> (u16, String) {
    let res = router.clone().oneshot(req).await.unwrap();
    let status = res.status().as_u16();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8_lossy(&bytes).into_owned())
}

pub fn png_bytes() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(8, 6, image::Rgb([120, 60, 30]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
    buf.into_inner()
}

pub fn files_in(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir).unwrap().count()
}
