use std::fmt::Write as _;
use std::path::Path;

use crate::domain::detection::{count_by_label, Detection};

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Una fila por detección: `class_id,label,score,x1,y1,x2,y2`.
pub fn detections_csv(detections: &[Detection]) -> String {
    let mut out = String::from("class_id,label,score,x1,y1,x2,y2\n");
    for d in detections {
        let _ = writeln!(
            out,
            "{},{},{:.4},{:.1},{:.1},{:.1},{:.1}",
            d.class_id,
            csv_field(&d.label),
            d.score,
            d.x1,
            d.y1,
            d.x2,
            d.y2
        );
    }
    out
}

/// Conteo por etiqueta: `label,count`.
pub fn counts_csv(detections: &[Detection]) -> String {
    let mut out = String::from("label,count\n");
    for (label, count) in count_by_label(detections) {
        let _ = writeln!(out, "{},{}", csv_field(label), count);
    }
    out
}

pub fn write_reports(detections: &[Detection], info_path: &Path, counts_path: &Path) -> std::io::Result<()> {
    std::fs::write(info_path, detections_csv(detections))?;
    std::fs::write(counts_path, counts_csv(detections))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(label: &str, score: f32) -> Detection {
        Detection { x1: 1.0, y1: 2.0, x2: 3.5, y2: 4.0, score, class_id: 7, label: label.into() }
    }

    #[test]
    fn detection_rows_are_quoted_when_needed() {
        let csv = detections_csv(&[det("fried rice", 0.5), det("salt, pepper", 0.25)]);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "class_id,label,score,x1,y1,x2,y2");
        assert_eq!(lines[1], "7,fried rice,0.5000,1.0,2.0,3.5,4.0");
        assert_eq!(lines[2], "7,\"salt, pepper\",0.2500,1.0,2.0,3.5,4.0");
    }

    #[test]
    fn counts_are_grouped() {
        let csv = counts_csv(&[det("soup", 0.9), det("rice", 0.8), det("soup", 0.7)]);
        assert_eq!(csv, "label,count\nrice,1\nsoup,2\n");
    }

    #[test]
    fn empty_results_still_write_headers() {
        let dir = tempfile::tempdir().unwrap();
        let (a, b) = (dir.path().join("a_info.csv"), dir.path().join("a_info2.csv"));
        write_reports(&[], &a, &b).unwrap();
        assert_eq!(std::fs::read_to_string(a).unwrap(), "class_id,label,score,x1,y1,x2,y2\n");
        assert_eq!(std::fs::read_to_string(b).unwrap(), "label,count\n");
    }
}
