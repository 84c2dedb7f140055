use axum::{
    extract::{Multipart, State},
    http::header::ACCESS_CONTROL_ALLOW_ORIGIN,
    response::{Html, IntoResponse, Response},
};
use tracing::{error, info};

use crate::adapters::http::{error::status_for, form::MultipartForm, state::HttpState, templates};
use crate::application::{dto::INVALID_INPUT_MESSAGE, services::AnalysisReport};
use crate::domain::{
    artifact::StoredArtifact,
    errors::{DomainError, DomainResult},
    model::InferenceOptions,
};

pub async fn homepage() -> impl IntoResponse {
    ([(ACCESS_CONTROL_ALLOW_ORIGIN, "*")], Html(templates::upload_page()))
}

pub async fn detect_by_url_page() -> Html<String> {
    Html(templates::url_page())
}

pub async fn detect_by_webcam_page() -> Html<String> {
    Html(templates::webcam_page())
}

pub async fn analyze(State(st): State<HttpState>, multipart: Multipart) -> Response {
    match run_analysis(&st, multipart).await {
        Ok(report) => Html(templates::result_page(&report, &st.config.layout)).into_response(),
        Err(DomainError::UnsupportedMedia { filename, kind }) => {
            info!("Entrada rechazada: {} ({})", filename, kind);
            Html(templates::error_page(INVALID_INPUT_MESSAGE)).into_response()
        }
        Err(e) => {
            error!("❌ Análisis fallido: {}", e);
            (status_for(&e), Html(templates::error_page(&e.to_string()))).into_response()
        }
    }
}

async fn run_analysis(st: &HttpState, multipart: Multipart) -> DomainResult<AnalysisReport> {
    let mut form = MultipartForm::collect(multipart).await?;
    let input = acquire(st, &mut form).await?;
    let options = InferenceOptions::try_from(form.options())?;
    st.analysis.analyze(input, options).await
}

/// El botón pulsado indica el origen de la entrada.
async fn acquire(st: &HttpState, form: &mut MultipartForm) -> DomainResult<StoredArtifact> {
    if form.has("webcam-button") {
        let blob = form
            .take_file("blob-file")
            .ok_or_else(|| DomainError::InvalidInput("falta blob-file".into()))?;
        st.acquisition.store_webcam(blob.bytes).await
    } else if form.has("url-button") {
        let url = form
            .text("url_link")
            .ok_or_else(|| DomainError::InvalidInput("falta url_link".into()))?
            .to_owned();
        st.acquisition.store_from_url(&url).await
    } else if form.has("upload-button") {
        let file = form
            .take_file("file")
            .ok_or_else(|| DomainError::InvalidInput("falta file".into()))?;
        st.acquisition.store_upload(&file.file_name, file.bytes).await
    } else {
        Err(DomainError::InvalidInput("no se indicó el origen (upload, url o webcam)".into()))
    }
}
