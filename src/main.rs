use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use yolo_media_web::{
    adapters::{
        command::CommandPredictor,
        fetch::http_fetcher::HttpMediaFetcher,
        http::{router, state::HttpState},
        onnx::{model_catalog::OnnxModelCatalog, predictor::OnnxPredictor},
    },
    application::{
        ports::PredictorPort,
        services::{AcquisitionService, AnalysisService},
    },
    config::{AppConfig, Args, PredictorConfig},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 1. Inicializar logs (RUST_LOG manda; si no, info o debug con --debug)
    let default_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let config = Arc::new(AppConfig::from_args(args)?);

    // 2. Crear el árbol de directorios una sola vez
    config.layout.ensure().await?;
    tracing::info!("📂 Almacenamiento en {}", config.layout.static_dir.display());

    // 3. Instanciar Adaptadores
    let fetcher = Arc::new(HttpMediaFetcher::new()?);
    let predictor: Arc<dyn PredictorPort> = match &config.predictor {
        PredictorConfig::Onnx { models_dir, input_size, max_detections } => {
            tracing::info!("🔧 Predictor onnx con modelos en {}", models_dir.display());
            Arc::new(OnnxPredictor::new(
                OnnxModelCatalog::new(models_dir),
                &config.layout.csv,
                *input_size,
                *max_detections,
            ))
        }
        PredictorConfig::Command { program, args } => {
            tracing::info!("🔧 Predictor externo: {} {:?}", program, args);
            Arc::new(CommandPredictor::new(program.clone(), args.clone()))
        }
    };

    // 4. Instanciar Servicios
    let state = HttpState {
        acquisition: Arc::new(AcquisitionService::new(config.layout.clone(), fetcher)),
        analysis: Arc::new(AnalysisService::new(config.layout.clone(), predictor)),
        config: config.clone(),
    };

    // 5. Lanzar el Servidor
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("🚀 Servidor {:?} iniciado en http://{}", config.app, config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
