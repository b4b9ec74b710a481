//! RGB image views and model-input preprocessing.
//!
//! `RgbView` is a borrowed view into interleaved 8-bit RGB pixels with an
//! explicit stride. The stride counts bytes between the starts of consecutive
//! rows, so a stride larger than `3 * width` represents padded rows.

use crate::util::{NutriScanError, NutriScanResult};

pub mod preprocess;

#[cfg(feature = "image-io")]
pub mod io;

/// Bytes per interleaved RGB pixel.
pub const RGB_CHANNELS: usize = 3;

/// Borrowed interleaved RGB view with an explicit row stride in bytes.
#[derive(Copy, Clone, Debug)]
pub struct RgbView<'a> {
    data: &'a [u8],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a> RgbView<'a> {
    /// Creates a contiguous view with `stride == 3 * width`.
    pub fn from_slice(data: &'a [u8], width: usize, height: usize) -> NutriScanResult<Self> {
        let stride = width
            .checked_mul(RGB_CHANNELS)
            .ok_or(NutriScanError::InvalidDimensions { width, height })?;
        Self::new(data, width, height, stride)
    }

    /// Creates a view with an explicit stride.
    pub fn new(
        data: &'a [u8],
        width: usize,
        height: usize,
        stride: usize,
    ) -> NutriScanResult<Self> {
        let needed = required_len(width, height, stride)?;
        if data.len() < needed {
            return Err(NutriScanError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the stride in bytes between row starts.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns the `[r, g, b]` pixel at `(x, y)` if it is within bounds.
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 3]> {
        let row = self.row(y)?;
        let start = x.checked_mul(RGB_CHANNELS)?;
        let px = row.get(start..start + RGB_CHANNELS)?;
        Some([px[0], px[1], px[2]])
    }

    /// Returns the `3 * width` bytes of row `y`.
    pub fn row(&self, y: usize) -> Option<&'a [u8]> {
        if y >= self.height {
            return None;
        }
        let start = y.checked_mul(self.stride)?;
        let end = start.checked_add(self.width * RGB_CHANNELS)?;
        self.data.get(start..end)
    }
}

/// Owned contiguous RGB buffer.
#[derive(Clone, Debug)]
pub struct OwnedRgbImage {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl OwnedRgbImage {
    /// Wraps an interleaved RGB buffer of exactly `3 * width * height` bytes.
    pub fn new(data: Vec<u8>, width: usize, height: usize) -> NutriScanResult<Self> {
        let needed = required_len(width, height, width.saturating_mul(RGB_CHANNELS))?;
        if data.len() < needed {
            return Err(NutriScanError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        if data.len() > needed {
            return Err(NutriScanError::InvalidDimensions { width, height });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Returns a borrowed view of the image.
    pub fn view(&self) -> RgbView<'_> {
        RgbView {
            data: &self.data,
            width: self.width,
            height: self.height,
            stride: self.width * RGB_CHANNELS,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

fn required_len(width: usize, height: usize, stride: usize) -> NutriScanResult<usize> {
    if width == 0 || height == 0 {
        return Err(NutriScanError::InvalidDimensions { width, height });
    }
    let row_bytes = width
        .checked_mul(RGB_CHANNELS)
        .ok_or(NutriScanError::InvalidDimensions { width, height })?;
    if stride < row_bytes {
        return Err(NutriScanError::InvalidStride { width, stride });
    }
    (height - 1)
        .checked_mul(stride)
        .and_then(|v| v.checked_add(row_bytes))
        .ok_or(NutriScanError::InvalidDimensions { width, height })
}

#[cfg(test)]
mod tests {
    use super::{OwnedRgbImage, RgbView};
    use crate::util::NutriScanError;

    #[test]
    fn rejects_invalid_dimensions() {
        let data = [0u8; 12];
        assert_eq!(
            RgbView::from_slice(&data, 0, 1).unwrap_err(),
            NutriScanError::InvalidDimensions {
                width: 0,
                height: 1
            }
        );
    }

    #[test]
    fn rejects_short_stride_and_small_buffer() {
        let data = [0u8; 12];
        assert_eq!(
            RgbView::new(&data, 2, 2, 5).unwrap_err(),
            NutriScanError::InvalidStride {
                width: 2,
                stride: 5
            }
        );
        assert_eq!(
            RgbView::from_slice(&data[..11], 2, 2).unwrap_err(),
            NutriScanError::BufferTooSmall {
                needed: 12,
                got: 11
            }
        );
    }

    #[test]
    fn padded_rows_are_skipped() {
        // 1x2 image with one padding byte per row.
        let data = [1u8, 2, 3, 99, 4, 5, 6];
        let view = RgbView::new(&data, 1, 2, 4).unwrap();
        assert_eq!(view.pixel(0, 0), Some([1, 2, 3]));
        assert_eq!(view.pixel(0, 1), Some([4, 5, 6]));
        assert_eq!(view.pixel(1, 0), None);
        assert_eq!(view.row(2), None);
    }

    #[test]
    fn owned_rejects_oversized_buffer() {
        assert!(OwnedRgbImage::new(vec![0u8; 13], 2, 2).is_err());
        let img = OwnedRgbImage::new(vec![7u8; 12], 2, 2).unwrap();
        assert_eq!(img.view().pixel(1, 1), Some([7, 7, 7]));
    }
}
