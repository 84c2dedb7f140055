use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::domain::detection::Detection;

const PLAIN_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Dibuja las cajas sobre la imagen. Con `enhance_labels` cada clase tiene su
/// color y el borde es doble; si no, todas en rojo con borde simple.
pub fn draw_detections(image: &mut RgbImage, detections: &[Detection], enhance_labels: bool) {
    for det in detections {
        let x = det.x1.max(0.0) as i32;
        let y = det.y1.max(0.0) as i32;
        let width = (det.x2.min(image.width() as f32) - det.x1.max(0.0)) as u32;
        let height = (det.y2.min(image.height() as f32) - det.y1.max(0.0)) as u32;
        if width == 0 || height == 0 {
            continue;
        }

        let color = if enhance_labels { class_color(det.class_id) } else { PLAIN_COLOR };
        draw_hollow_rect_mut(image, Rect::at(x, y).of_size(width, height), color);

        if enhance_labels && width > 2 && height > 2 {
            let inner = Rect::at(x + 1, y + 1).of_size(width - 2, height - 2);
            draw_hollow_rect_mut(image, inner, color);
        }
    }
}

/// Paleta de 80 tonos repartidos en HSV.
fn class_color(class_id: usize) -> Rgb<u8> {
    let hue = ((class_id % 80) as f32 / 80.0) * 360.0;
    hsv_to_rgb(hue, 0.8, 0.9)
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Rgb<u8> {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = match h {
        h if h < 60.0 => (c, x, 0.0),
        h if h < 120.0 => (x, c, 0.0),
        h if h < 180.0 => (0.0, c, x),
        h if h < 240.0 => (0.0, x, c),
        h if h < 300.0 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    Rgb([
        ((r + m) * 255.0) as u8,
        ((g + m) * 255.0) as u8,
        ((b + m) * 255.0) as u8,
    ])
}
