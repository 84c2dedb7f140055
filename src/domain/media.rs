use serde::{Deserialize, Serialize};
use std::fmt;

pub const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];
pub const VIDEO_EXTENSIONS: [&str; 4] = ["mp4", "avi", "3gpp", "3gp"];

/// Clasificación de un archivo según su extensión.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Invalid,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Invalid => "invalid",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clasifica un nombre (o ruta) de archivo por su último sufijo, sin mirar el contenido.
/// Un archivo renombrado con una extensión incorrecta se clasifica mal.
pub fn classify(path: &str) -> MediaKind {
    let filename = path.rsplit('/').next().unwrap_or(path);
    let Some((_, ext)) = filename.rsplit_once('.') else {
        return MediaKind::Invalid;
    };
    let ext = ext.to_ascii_lowercase();

    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        MediaKind::Image
    } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        MediaKind::Video
    } else {
        MediaKind::Invalid
    }
}

/// Extensión con el punto incluido y sin cambiar mayúsculas (`"a.JPG"` -> `".JPG"`).
/// Los nombres que empiezan por punto (`".bashrc"`) no tienen extensión.
pub fn extension_of(filename: &str) -> &str {
    let stem_start = filename.len() - filename.trim_start_matches('.').len();
    match filename[stem_start..].rfind('.') {
        Some(idx) => &filename[stem_start + idx..],
        None => "",
    }
}

/// Limpia el nombre enviado por el cliente para poder usarlo en disco:
/// sin separadores de ruta, sin caracteres de control ni fuera de `[A-Za-z0-9_.-]`.
pub fn sanitize_filename(raw: &str) -> String {
    let replaced: String = raw
        .chars()
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = replaced.split_whitespace().collect::<Vec<_>>().join("_");

    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();

    kept.trim_matches(|c| c == '.' || c == '_').to_string()
}
