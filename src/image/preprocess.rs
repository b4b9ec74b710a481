//! Bilinear resize and normalization to the detector input tensor.
//!
//! The detector takes a square `INPUT_SIZE x INPUT_SIZE` RGB frame as NHWC
//! `f32` values in `[0, 1]`. Resizing samples with half-pixel centers:
//! destination pixel `x` maps to source coordinate `(x + 0.5) * sx - 0.5`,
//! clamped to the valid range, and is interpolated from its four neighbours.

use crate::image::{RgbView, RGB_CHANNELS};
use crate::trace::trace_span;

/// Side length of the square detector input.
pub const INPUT_SIZE: usize = 320;

/// Divisor mapping 8-bit samples to `[0, 1]`.
pub const PIXEL_SCALE: f32 = 255.0;

/// Resizes `src` to `size x size` and scales samples by `1 / PIXEL_SCALE`.
///
/// Output is NHWC (`size * size * 3` values, row-major, RGB interleaved).
pub fn resize_normalize(src: RgbView<'_>, size: usize) -> Vec<f32> {
    let _span = trace_span!(
        "preprocess",
        src_width = src.width(),
        src_height = src.height(),
        size = size
    )
    .entered();

    let mut out = vec![0.0f32; size * size * RGB_CHANNELS];
    if size == 0 {
        return out;
    }

    let width = src.width();
    let height = src.height();
    let sx = width as f32 / size as f32;
    let sy = height as f32 / size as f32;
    let max_x = (width - 1) as f32;
    let max_y = (height - 1) as f32;

    for y in 0..size {
        let src_y = ((y as f32 + 0.5) * sy - 0.5).clamp(0.0, max_y);
        let y0 = src_y.floor() as usize;
        let y1 = (y0 + 1).min(height - 1);
        let fy = src_y - y0 as f32;
        // Rows exist: y0, y1 < height and the view was validated on creation.
        let (Some(row0), Some(row1)) = (src.row(y0), src.row(y1)) else {
            continue;
        };

        for x in 0..size {
            let src_x = ((x as f32 + 0.5) * sx - 0.5).clamp(0.0, max_x);
            let x0 = src_x.floor() as usize;
            let x1 = (x0 + 1).min(width - 1);
            let fx = src_x - x0 as f32;

            let w00 = (1.0 - fx) * (1.0 - fy);
            let w10 = fx * (1.0 - fy);
            let w01 = (1.0 - fx) * fy;
            let w11 = fx * fy;

            let dst = (y * size + x) * RGB_CHANNELS;
            for c in 0..RGB_CHANNELS {
                let a = row0[x0 * RGB_CHANNELS + c] as f32;
                let b = row0[x1 * RGB_CHANNELS + c] as f32;
                let d0 = row1[x0 * RGB_CHANNELS + c] as f32;
                let d1 = row1[x1 * RGB_CHANNELS + c] as f32;
                let value = a * w00 + b * w10 + d0 * w01 + d1 * w11;
                out[dst + c] = value / PIXEL_SCALE;
            }
        }
    }

    out
}

/// Produces the detector input for `src` at the fixed `INPUT_SIZE`.
pub fn to_model_input(src: RgbView<'_>) -> Vec<f32> {
    resize_normalize(src, INPUT_SIZE)
}
