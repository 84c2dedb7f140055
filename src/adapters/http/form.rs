use axum::extract::Multipart;
use std::collections::HashMap;

use crate::application::dto::AnalyzeOptionsForm;
use crate::domain::errors::{DomainError, DomainResult};

/// Archivo recibido en una parte multipart.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Cuerpo multipart ya leído: campos de texto por un lado, archivos por otro.
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl MultipartForm {
    pub async fn collect(mut multipart: Multipart) -> DomainResult<Self> {
        let bad = |e: axum::extract::multipart::MultipartError| DomainError::InvalidInput(format!("multipart: {e}"));
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(bad)? {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };
            // Una parte con filename es un archivo, aunque venga vacío
            match field.file_name().map(str::to_owned) {
                Some(file_name) => {
                    let bytes = field.bytes().await.map_err(bad)?;
                    form.files.insert(name, UploadedFile { file_name, bytes: bytes.to_vec() });
                }
                None => {
                    let text = field.text().await.map_err(bad)?;
                    form.fields.insert(name, text);
                }
            }
        }
        Ok(form)
    }

    /// Presente como campo de texto o como archivo.
    pub fn has(&self, name: &str) -> bool {
        self.fields.contains_key(name) || self.files.contains_key(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name)
    }

    pub fn options(&self) -> AnalyzeOptionsForm {
        AnalyzeOptionsForm::from_lookup(|name| self.text(name))
    }
}
