use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};

/// Qué adaptador HTTP se levanta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AppKind {
    /// Páginas HTML para el navegador
    Ui,
    /// API JSON
    Api,
}

/// Implementación de la función de predicción.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PredictorKind {
    /// Detector YOLO integrado sobre ONNX Runtime
    Onnx,
    /// Programa externo invocado como subproceso
    Command,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Adaptador HTTP a servir
    #[arg(long, value_enum, default_value_t = AppKind::Ui, env = "MEDIA_APP")]
    pub app: AppKind,

    #[arg(long, default_value = "0.0.0.0", env = "MEDIA_HOST")]
    pub host: String,

    #[arg(long, default_value_t = 8000, env = "MEDIA_PORT")]
    pub port: u16,

    /// Raíz de los archivos estáticos (uploads, detecciones, CSV)
    #[arg(long, default_value = "static", value_name = "DIR")]
    pub static_dir: PathBuf,

    #[arg(long, value_enum, default_value_t = PredictorKind::Onnx)]
    pub predictor: PredictorKind,

    /// Directorio con los modelos `<nombre>.onnx` (y `labels.txt` opcional)
    #[arg(long, default_value = "models", value_name = "DIR")]
    pub models_dir: PathBuf,

    #[arg(long, default_value_t = 640)]
    pub input_size: u32,

    #[arg(long, default_value_t = 300)]
    pub max_detections: usize,

    /// Programa de predicción externo (con `--predictor command`)
    #[arg(long, value_name = "PROGRAM")]
    pub predict_command: Option<String>,

    /// Argumento extra para el programa externo, repetible
    #[arg(long = "predict-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub predict_args: Vec<String>,

    /// Tamaño máximo del cuerpo de la petición, en MiB
    #[arg(long, default_value_t = 64)]
    pub max_upload_mb: usize,

    /// Nivel de log `debug` por defecto
    #[arg(long)]
    pub debug: bool,
}

/// Árbol de directorios donde se guardan entradas y resultados.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    pub static_dir: PathBuf,
    pub uploads: PathBuf,
    pub detections: PathBuf,
    pub segmentations: PathBuf,
    pub csv: PathBuf,
    pub metadata: PathBuf,
}

impl StorageLayout {
    pub fn under(static_dir: impl Into<PathBuf>) -> Self {
        let static_dir = static_dir.into();
        Self {
            uploads: static_dir.join("assets").join("uploads"),
            detections: static_dir.join("assets").join("detections"),
            segmentations: static_dir.join("assets").join("segmentations"),
            csv: static_dir.join("csv"),
            metadata: static_dir.join("metadata"),
            static_dir,
        }
    }

    /// Crea todos los directorios; idempotente.
    pub async fn ensure(&self) -> std::io::Result<()> {
        for dir in [&self.uploads, &self.detections, &self.segmentations, &self.csv, &self.metadata] {
            tokio::fs::create_dir_all(dir).await?;
        }
        Ok(())
    }

    /// Destino del resultado: las segmentaciones van a su propio árbol.
    pub fn output_path(&self, filename: &str, segmentation: bool) -> PathBuf {
        if segmentation {
            self.segmentations.join(filename)
        } else {
            self.detections.join(filename)
        }
    }

    /// URL pública (`/static/...`) de un archivo dentro del directorio estático.
    pub fn public_url(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.static_dir).ok()?;
        let parts: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(format!("/static/{}", parts.join("/")))
    }
}

#[derive(Debug, Clone)]
pub enum PredictorConfig {
    Onnx {
        models_dir: PathBuf,
        input_size: u32,
        max_detections: usize,
    },
    Command {
        program: String,
        args: Vec<String>,
    },
}

/// Configuración inmutable compartida por los manejadores.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app: AppKind,
    pub bind_addr: String,
    pub layout: StorageLayout,
    pub predictor: PredictorConfig,
    pub max_upload_bytes: usize,
}

impl AppConfig {
    pub fn from_args(args: Args) -> anyhow::Result<Self> {
        let predictor = match args.predictor {
            PredictorKind::Onnx => PredictorConfig::Onnx {
                models_dir: args.models_dir,
                input_size: args.input_size,
                max_detections: args.max_detections,
            },
            PredictorKind::Command => PredictorConfig::Command {
                program: args
                    .predict_command
                    .ok_or_else(|| anyhow::anyhow!("--predictor command requiere --predict-command"))?,
                args: args.predict_args,
            },
        };

        Ok(Self {
            app: args.app,
            bind_addr: format!("{}:{}", args.host, args.port),
            layout: StorageLayout::under(args.static_dir),
            predictor,
            max_upload_bytes: args.max_upload_mb * 1024 * 1024,
        })
    }
}
