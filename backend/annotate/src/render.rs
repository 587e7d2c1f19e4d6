//! Bounding-box rendering.
//!
//! Draws parsed detections onto a 3-channel copy of the source image. The
//! caller's image is never touched: with no detections the input is handed
//! back borrowed, otherwise a fresh RGB raster of the same dimensions is
//! returned.

use std::borrow::Cow;

use image::{DynamicImage, Rgb};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;
use tracing::debug;

use refscope_core::Detection;

use crate::font::LabelFont;

/// Coordinates at or below this value are taken to be on the 0–999 grid.
const NORMALIZED_MAX: u32 = 999;
/// Box outline thickness in pixels.
const STROKE_WIDTH: i32 = 2;
/// Padding around the label text inside its background, in pixels.
const LABEL_PADDING: u32 = 4;
/// Label text is always white; backgrounds come from the palette.
const LABEL_TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// Colors handed out to labels in first-seen order, cycling when exhausted.
const PALETTE: [Rgb<u8>; 8] = [
    Rgb([220, 38, 38]),  // red
    Rgb([22, 163, 74]),  // green
    Rgb([37, 99, 235]),  // blue
    Rgb([202, 138, 4]),  // amber
    Rgb([192, 38, 211]), // fuchsia
    Rgb([8, 145, 178]),  // cyan
    Rgb([234, 88, 12]),  // orange
    Rgb([124, 58, 237]), // violet
];

/// Draw `detections` onto a copy of `image`, in parse order.
///
/// With an empty list the original image is returned borrowed, pixel for
/// pixel. Otherwise the result is a new `Rgb8` raster of identical
/// dimensions; inverted, degenerate, and out-of-range boxes are normalized
/// and clamped rather than rejected.
pub fn render<'a>(image: &'a DynamicImage, detections: &[Detection]) -> Cow<'a, DynamicImage> {
    if detections.is_empty() {
        return Cow::Borrowed(image);
    }

    let mut canvas = image.to_rgb8();
    let (width, height) = canvas.dimensions();
    let (scale_x, scale_y) = coordinate_scale(detections, width, height);
    debug!(count = detections.len(), scale_x, scale_y, "rendering detections");

    let font = LabelFont::resolve();
    let mut colors = ColorMap::default();

    for detection in detections {
        let (x_lo, y_lo, x_hi, y_hi) = pixel_box(detection, scale_x, scale_y, width, height);
        let color = colors.resolve(&detection.name);

        // Corners are inclusive: the outline must land on x_hi/y_hi, and the
        // clamp above already keeps them inside the image.
        let box_w = (x_hi - x_lo + 1) as u32;
        let box_h = (y_hi - y_lo + 1) as u32;
        for inset in 0..STROKE_WIDTH {
            let w = box_w.saturating_sub(2 * inset as u32).max(1);
            let h = box_h.saturating_sub(2 * inset as u32).max(1);
            draw_hollow_rect_mut(&mut canvas, Rect::at(x_lo + inset, y_lo + inset).of_size(w, h), color);
        }

        draw_label(&mut canvas, &font, &detection.name, x_lo, y_lo, color);
    }

    Cow::Owned(DynamicImage::ImageRgb8(canvas))
}

/// Batch-wide scale factors resolving the normalized-vs-absolute ambiguity.
///
/// If the maximum coordinate across the whole batch is at most 999, every
/// coordinate is treated as normalized to the 0–999 grid and scaled by
/// `width/1000` and `height/1000`; otherwise all are absolute pixels.
///
/// Known limitation, kept deliberately: a model reporting genuinely absolute
/// coordinates that all happen to fall at or below 999 (small image, small
/// boxes) is mis-scaled. There is no flag in the model output that would let
/// us tell the two apart per detection.
fn coordinate_scale(detections: &[Detection], width: u32, height: u32) -> (f32, f32) {
    let max = detections
        .iter()
        .flat_map(|d| [d.x1, d.y1, d.x2, d.y2])
        .max()
        .unwrap_or(0);
    if max <= NORMALIZED_MAX {
        (width as f32 / 1000.0, height as f32 / 1000.0)
    } else {
        (1.0, 1.0)
    }
}

/// Order the corners, apply the scale, round, and clamp into the image.
/// Returns `(x_lo, y_lo, x_hi, y_hi)` with every value inside
/// `[0, width-1]` / `[0, height-1]`.
fn pixel_box(
    detection: &Detection,
    scale_x: f32,
    scale_y: f32,
    width: u32,
    height: u32,
) -> (i32, i32, i32, i32) {
    let clamp = |value: f32, limit: u32| -> i32 {
        (value.round() as i64).clamp(0, limit.saturating_sub(1) as i64) as i32
    };
    let x_lo = clamp(detection.x1.min(detection.x2) as f32 * scale_x, width);
    let x_hi = clamp(detection.x1.max(detection.x2) as f32 * scale_x, width);
    let y_lo = clamp(detection.y1.min(detection.y2) as f32 * scale_y, height);
    let y_hi = clamp(detection.y1.max(detection.y2) as f32 * scale_y, height);
    (x_lo, y_lo, x_hi, y_hi)
}

fn draw_label(
    canvas: &mut image::RgbImage,
    font: &LabelFont,
    name: &str,
    x_lo: i32,
    y_lo: i32,
    color: Rgb<u8>,
) {
    let (text_w, text_h) = font.measure(name);
    let label_w = text_w + 2 * LABEL_PADDING;
    let label_h = text_h + 2 * LABEL_PADDING;
    // Above the box when there is room, flush with the top edge otherwise.
    let label_y = (y_lo - label_h as i32).max(0);
    draw_filled_rect_mut(canvas, Rect::at(x_lo, label_y).of_size(label_w, label_h), color);
    font.draw(
        canvas,
        LABEL_TEXT_COLOR,
        x_lo + LABEL_PADDING as i32,
        label_y + LABEL_PADDING as i32,
        name,
    );
}

/// Label→color assignment local to one render call. First-seen labels take
/// the next palette entry; repeats reuse their entry. Label counts per
/// request are small, so a vector scan beats a map here.
#[derive(Default)]
struct ColorMap {
    assigned: Vec<(String, Rgb<u8>)>,
}

impl ColorMap {
    fn resolve(&mut self, name: &str) -> Rgb<u8> {
        if let Some((_, color)) = self.assigned.iter().find(|(n, _)| n == name) {
            return *color;
        }
        let color = PALETTE[self.assigned.len() % PALETTE.len()];
        self.assigned.push((name.to_string(), color));
        color
    }
}
