//! Server-side bar charts, returned as `data:` URIs a view can embed directly.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use derive_more::{Display, Error};
use image::{ColorType, ImageEncoder, Rgb, RgbImage, codecs::png::PngEncoder};

const WIDTH: u32 = 640;
const HEIGHT: u32 = 400;

const PLOT_LEFT: i64 = 70;
const PLOT_RIGHT: i64 = 620;
const PLOT_TOP: i64 = 50;
const PLOT_BOTTOM: i64 = 300;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS: Rgb<u8> = Rgb([64, 64, 64]);
const BAR: Rgb<u8> = Rgb([135, 206, 235]);
const TEXT: Rgb<u8> = Rgb([20, 20, 20]);

const TITLE_SCALE: i64 = 2;
const LABEL_SCALE: i64 = 1;
const GLYPH_ADVANCE: i64 = 6;

#[derive(Debug, Display, Error, PartialEq)]
pub enum ChartError {
    #[display(fmt = "{} labels but {} values", labels, values)]
    LengthMismatch { labels: usize, values: usize },

    #[display(fmt = "png encoding failed: {}", _0)]
    Encode(#[error(not(source))] String),
}

/// Renders `values` as a bar chart against `labels`, titled `title`.
pub fn render_bar_chart(labels: &[String], values: &[f64], title: &str) -> Result<String, ChartError> {
    if labels.len() != values.len() {
        return Err(ChartError::LengthMismatch {
            labels: labels.len(),
            values: values.len(),
        });
    }

    let mut canvas = RgbImage::from_pixel(WIDTH, HEIGHT, BACKGROUND);

    let values: Vec<f64> = values
        .iter()
        .map(|v| if v.is_finite() { *v } else { 0.0 })
        .collect();
    let max_pos = values.iter().copied().fold(0.0_f64, f64::max);
    let max_neg = values.iter().copied().fold(0.0_f64, |acc, v| acc.max(-v));
    let span = max_pos + max_neg;
    let plot_height = (PLOT_BOTTOM - PLOT_TOP) as f64;

    let baseline = if span > 0.0 {
        PLOT_TOP + (plot_height * max_pos / span).round() as i64
    } else {
        PLOT_BOTTOM
    };

    for (i, value) in values.iter().enumerate() {
        if span <= 0.0 || *value == 0.0 {
            continue;
        }
        let (left, right) = bar_extent(i, values.len());
        let height = (plot_height * value.abs() / span).round() as i64;
        let (top, bottom) = if *value > 0.0 {
            (baseline - height, baseline)
        } else {
            (baseline, baseline + height)
        };
        fill_rect(&mut canvas, left, top, right, bottom, BAR);
    }

    // axes
    fill_rect(&mut canvas, PLOT_LEFT, PLOT_TOP, PLOT_LEFT + 1, PLOT_BOTTOM, AXIS);
    fill_rect(&mut canvas, PLOT_LEFT, baseline, PLOT_RIGHT, baseline + 1, AXIS);

    if max_pos > 0.0 {
        let text = format!("{max_pos:.0}");
        let x = PLOT_LEFT - 4 - text_width(&text, LABEL_SCALE);
        draw_text(&mut canvas, &text, x, PLOT_TOP - 3, LABEL_SCALE, TEXT);
    }

    let title_x = (WIDTH as i64 - text_width(title, TITLE_SCALE)) / 2;
    draw_text(&mut canvas, title, title_x.max(0), 14, TITLE_SCALE, TEXT);

    for (i, label) in labels.iter().enumerate() {
        let (left, right) = bar_extent(i, labels.len());
        draw_label_rotated(&mut canvas, label, (left + right) / 2, PLOT_BOTTOM + 10);
    }

    encode_data_uri(&canvas)
}

fn encode_data_uri(canvas: &RgbImage) -> Result<String, ChartError> {
    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(canvas.as_raw(), canvas.width(), canvas.height(), ColorType::Rgb8)
        .map_err(|e| ChartError::Encode(e.to_string()))?;

    Ok(format!("data:image/png;base64,{}", BASE64.encode(&png)))
}

/// Horizontal pixel range of bar `index` out of `count`.
fn bar_extent(index: usize, count: usize) -> (i64, i64) {
    let slot = (PLOT_RIGHT - PLOT_LEFT - 2) as f64 / count.max(1) as f64;
    let start = PLOT_LEFT + 2 + (slot * index as f64) as i64;
    let margin = (slot * 0.2) as i64;
    (start + margin, start + (slot as i64) - margin)
}

fn put(canvas: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && x < canvas.width() as i64 && y < canvas.height() as i64 {
        canvas.put_pixel(x as u32, y as u32, color);
    }
}

fn fill_rect(canvas: &mut RgbImage, left: i64, top: i64, right: i64, bottom: i64, color: Rgb<u8>) {
    for y in top..bottom {
        for x in left..right {
            put(canvas, x, y, color);
        }
    }
}

fn text_width(text: &str, scale: i64) -> i64 {
    text.chars().count() as i64 * GLYPH_ADVANCE * scale
}

fn draw_text(canvas: &mut RgbImage, text: &str, x: i64, y: i64, scale: i64, color: Rgb<u8>) {
    for (i, c) in text.chars().enumerate() {
        let origin = x + i as i64 * GLYPH_ADVANCE * scale;
        for (row, bits) in glyph(c).iter().enumerate() {
            for col in 0..5 {
                if bits & (0x10 >> col) != 0 {
                    let px = origin + col * scale;
                    let py = y + row as i64 * scale;
                    fill_rect(canvas, px, py, px + scale, py + scale, color);
                }
            }
        }
    }
}

/// Draws `text` running up and to the right at 45 degrees, ending at the tick.
fn draw_label_rotated(canvas: &mut RgbImage, text: &str, tick_x: i64, tick_y: i64) {
    let (sin, cos) = std::f64::consts::FRAC_PI_4.sin_cos();
    let length = text_width(text, LABEL_SCALE) as f64;
    let origin_x = tick_x as f64 - length * cos;
    let origin_y = tick_y as f64 + length * sin;

    for (i, c) in text.chars().enumerate() {
        for (row, bits) in glyph(c).iter().enumerate() {
            for col in 0..5 {
                if bits & (0x10 >> col) == 0 {
                    continue;
                }
                let gx = ((i as i64 * GLYPH_ADVANCE + col) * LABEL_SCALE) as f64;
                let gy = (row as i64 * LABEL_SCALE) as f64;
                // along the baseline (cos, -sin), down the glyph (sin, cos)
                let px = origin_x + gx * cos + gy * sin;
                let py = origin_y - gx * sin + gy * cos;
                let (px, py) = (px.round() as i64, py.round() as i64);
                fill_rect(canvas, px, py, px + LABEL_SCALE + 1, py + LABEL_SCALE + 1, TEXT);
            }
        }
    }
}

/// 5x7 bitmap glyphs, one byte per row, high bit on the left.
fn glyph(c: char) -> [u8; 7] {
    match c.to_ascii_uppercase() {
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1C, 0x12, 0x11, 0x11, 0x11, 0x12, 0x1C],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        'Y' => [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04],
        'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
        ' ' => [0x00; 7],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        ',' => [0x00, 0x00, 0x00, 0x00, 0x0C, 0x04, 0x08],
        ':' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00],
        '/' => [0x00, 0x01, 0x02, 0x04, 0x08, 0x10, 0x00],
        '_' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x1F],
        '(' => [0x02, 0x04, 0x08, 0x08, 0x08, 0x04, 0x02],
        ')' => [0x08, 0x04, 0x02, 0x02, 0x02, 0x04, 0x08],
        _ => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x00, 0x04],
    }
}
