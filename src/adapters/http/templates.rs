use std::path::Path;

use crate::application::services::AnalysisReport;
use crate::config::StorageLayout;

const OPTIONS: &str = include_str!("../../../templates/options.html");
const UPLOAD_FILE: &str = include_str!("../../../templates/upload-file.html");
const INPUT_URL: &str = include_str!("../../../templates/input-url.html");
const WEBCAM_CAPTURE: &str = include_str!("../../../templates/webcam-capture.html");
const RESULT: &str = include_str!("../../../templates/result.html");
const ERROR: &str = include_str!("../../../templates/error.html");

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Sustituye `{{> options }}` por el fragmento de opciones y cada `{{ clave }}` por su valor escapado.
fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut html = template.replace("{{> options }}", OPTIONS);
    for (key, value) in vars {
        html = html.replace(&format!("{{{{ {key} }}}}"), &escape(value));
    }
    html
}

pub fn upload_page() -> String {
    render(UPLOAD_FILE, &[])
}

pub fn url_page() -> String {
    render(INPUT_URL, &[])
}

pub fn webcam_page() -> String {
    render(WEBCAM_CAPTURE, &[])
}

pub fn error_page(message: &str) -> String {
    render(ERROR, &[("error_msg", message)])
}

pub fn result_page(report: &AnalysisReport, layout: &StorageLayout) -> String {
    let url = |p: &Path| layout.public_url(p).unwrap_or_else(|| p.display().to_string());
    render(
        RESULT,
        &[
            ("filename", report.filename.as_str()),
            ("output_type", report.output_type.as_str()),
            ("input_url", url(&report.input.path).as_str()),
            ("output_url", url(&report.output_path).as_str()),
            ("csv_info_url", url(&report.csv_info).as_str()),
            ("csv_counts_url", url(&report.csv_counts).as_str()),
        ],
    )
}
