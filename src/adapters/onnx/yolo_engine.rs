use anyhow::{anyhow, Result};
use image::{imageops::FilterType, RgbImage};
use ndarray::{s, Array4, ArrayViewD, Axis, IxDyn};
use ort::execution_providers::CUDAExecutionProvider;
use ort::session::Session;
use ort::value::Tensor;
use std::fs;
use std::path::Path;

use crate::domain::detection::Detection;

pub struct OnnxYoloEngine {
    session: Session,
}

impl OnnxYoloEngine {
    pub fn load(path: &Path) -> Result<Self> {
        let mut builder = Session::builder()?.with_intra_threads(4)?;

        // CUDA es opcional: si está disponible se registra, si no continuamos en CPU.
        let cuda = CUDAExecutionProvider::default().build();
        if let Ok(builder_with_cuda) = builder.clone().with_execution_providers([cuda]) {
            builder = builder_with_cuda;
        }

        let model_bytes = fs::read(path)?;
        let session = builder.commit_from_memory(&model_bytes)?;

        tracing::info!("🧠 Modelo cargado: {}", path.display());
        Ok(Self { session })
    }

    /// Candidatos con score >= `min_conf`, en coordenadas de la imagen original.
    /// La supresión de no máximos se hace fuera, una vez juntados TTA y ensemble.
    pub fn infer(&mut self, rgb: &RgbImage, input_size: u32, min_conf: f32, labels: &[String]) -> Result<Vec<Detection>> {
        let imgsz = input_size as usize;
        let input = to_nchw(rgb, input_size);

        let input_shape = vec![1, 3, imgsz as i64, imgsz as i64];
        let (raw, _) = input.into_raw_vec_and_offset();
        let input_tensor = Tensor::from_array((input_shape, raw))?;

        let outputs = self.session.run(ort::inputs![input_tensor])?;
        let (shape_out, data_out) = outputs[0].try_extract_tensor::<f32>()?;

        let dims: Vec<usize> = shape_out.iter().map(|&x| x as usize).collect();
        if dims.len() != 3 || dims[1] < 5 {
            return Err(anyhow!("salida YOLO inesperada: {:?}", dims));
        }
        let array_view = ArrayViewD::from_shape(IxDyn(&dims), data_out)?;
        let view = array_view.index_axis(Axis(0), 0);

        let num_candidates = view.shape()[1];
        let sx = rgb.width() as f32 / imgsz as f32;
        let sy = rgb.height() as f32 / imgsz as f32;

        let mut detections = Vec::new();

        for i in 0..num_candidates {
            let scores = view.slice(s![4.., i]);
            let Some((class_id, &max_score)) = scores
                .indexed_iter()
                .max_by(|(_, a), (_, b)| a.total_cmp(b))
            else {
                continue;
            };

            if max_score >= min_conf {
                let cx = view[[0, i]];
                let cy = view[[1, i]];
                let w = view[[2, i]];
                let h = view[[3, i]];

                detections.push(Detection {
                    x1: ((cx - w / 2.0) * sx).max(0.0),
                    y1: ((cy - h / 2.0) * sy).max(0.0),
                    x2: ((cx + w / 2.0) * sx).min(rgb.width() as f32),
                    y2: ((cy + h / 2.0) * sy).min(rgb.height() as f32),
                    score: max_score,
                    class_id,
                    label: labels
                        .get(class_id)
                        .cloned()
                        .unwrap_or_else(|| format!("class_{class_id}")),
                });
            }
        }

        Ok(detections)
    }
}

/// Redimensiona a `size`x`size` y normaliza a NCHW en 0..1.
fn to_nchw(rgb: &RgbImage, size: u32) -> Array4<f32> {
    let imgsz = size as usize;
    let resized = image::imageops::resize(rgb, size, size, FilterType::Nearest);

    let mut input = Array4::<f32>::zeros((1, 3, imgsz, imgsz));
    for (x, y, pixel) in resized.enumerate_pixels() {
        input[[0, 0, y as usize, x as usize]] = pixel[0] as f32 / 255.0;
        input[[0, 1, y as usize, x as usize]] = pixel[1] as f32 / 255.0;
        input[[0, 2, y as usize, x as usize]] = pixel[2] as f32 / 255.0;
    }
    input
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tensor_is_normalized_channels_first() {
        let img = RgbImage::from_pixel(10, 20, image::Rgb([255, 0, 51]));
        let t = to_nchw(&img, 8);
        assert_eq!(t.shape(), &[1, 3, 8, 8]);
        assert_eq!(t[[0, 0, 3, 3]], 1.0);
        assert_eq!(t[[0, 1, 3, 3]], 0.0);
        assert!((t[[0, 2, 7, 7]] - 0.2).abs() < 1e-6);
    }
}
