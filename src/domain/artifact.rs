use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use super::media::{extension_of, MediaKind};

/// Origen del archivo de entrada.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Upload,
    Url,
    Webcam,
}

/// Archivo guardado en disco por la adquisición de entrada.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredArtifact {
    pub filename: String,
    pub path: PathBuf,
    pub kind: MediaKind,
    pub source: SourceKind,
}

/// Nombre direccionado por contenido: `<sha256 hex><extensión original>`.
pub fn content_addressed_name(bytes: &[u8], original_name: &str) -> String {
    let digest = Sha256::digest(bytes);
    format!("{:x}{}", digest, extension_of(original_name))
}

/// Nombre para capturas de webcam: `YYYYMMDD-HHMMSS.png` en hora local.
pub fn timestamp_name(now: chrono::DateTime<chrono::Local>) -> String {
    format!("{}.png", now.format("%Y%m%d-%H%M%S"))
}

/// Rutas de los dos CSV que acompañan a un resultado: `<stem>_info.csv` y `<stem>_info2.csv`.
pub fn csv_side_files(csv_dir: &Path, output_path: &Path) -> (PathBuf, PathBuf) {
    let stem = output_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    (
        csv_dir.join(format!("{stem}_info.csv")),
        csv_dir.join(format!("{stem}_info2.csv")),
    )
}
