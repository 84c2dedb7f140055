use axum::{
    extract::{Multipart, State},
    http::header::ACCESS_CONTROL_ALLOW_ORIGIN,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, info};

use crate::adapters::http::{error::status_for, form::MultipartForm, state::HttpState};
use crate::application::{
    dto::{invalid_format_message, AnalyzeResponse, MessageResponse, NO_FILE_MESSAGE},
    services::AnalysisReport,
};
use crate::domain::{
    errors::{DomainError, DomainResult},
    model::InferenceOptions,
};

pub async fn homepage() -> impl IntoResponse {
    ([(ACCESS_CONTROL_ALLOW_ORIGIN, "*")], "Hello World")
}

pub async fn analyze(State(st): State<HttpState>, multipart: Multipart) -> Response {
    let mut form = match MultipartForm::collect(multipart).await {
        Ok(form) => form,
        Err(e) => return message(&e),
    };

    let Some(file) = form.take_file("file") else {
        return Json(MessageResponse::new(NO_FILE_MESSAGE)).into_response();
    };

    match run_analysis(&st, &form, file.file_name, file.bytes).await {
        Ok(report) => Json(AnalyzeResponse {
            filename: report.filename,
            csv_name1: report.csv_info.display().to_string(),
            csv_name2: report.csv_counts.display().to_string(),
            output_type: report.output_type,
        })
        .into_response(),
        Err(DomainError::UnsupportedMedia { filename, kind }) => {
            info!("Archivo rechazado: {} ({})", filename, kind);
            Json(MessageResponse::new(invalid_format_message())).into_response()
        }
        Err(e) => {
            error!("❌ Análisis fallido: {}", e);
            message(&e)
        }
    }
}

async fn run_analysis(
    st: &HttpState,
    form: &MultipartForm,
    file_name: String,
    bytes: Vec<u8>,
) -> DomainResult<AnalysisReport> {
    let input = st.acquisition.store_upload(&file_name, bytes).await?;
    let options = InferenceOptions::try_from(form.options())?;
    st.analysis.analyze(input, options).await
}

fn message(err: &DomainError) -> Response {
    (status_for(err), Json(MessageResponse::new(err.to_string()))).into_response()
}
