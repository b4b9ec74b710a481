//! Decoding of raw detector output into candidates.
//!
//! The detector emits a single `[1, C + 4, N]` float tensor: for each of the
//! `N` boxes, four geometry channels (center x, center y, width, height, all
//! normalized) followed by `C` class scores. Channel `k` of box `i` lives at
//! `k * N + i`, so reading one box is a strided gather across the buffer.

use crate::candidate::Candidate;
use crate::geometry::BoundingBox;
use crate::trace::{trace_event, trace_span};
use crate::util::{NutriScanError, NutriScanResult};

#[cfg(feature = "rayon")]
pub mod rayon;

/// Scores must be strictly greater than this to survive decoding.
pub const CONFIDENCE_THRESHOLD: f32 = 0.5;

/// Number of geometry channels preceding the class scores.
pub const BOX_CHANNELS: usize = 4;

/// Borrowed view of a channel-major detector output tensor.
#[derive(Clone, Copy, Debug)]
pub struct TensorView<'a> {
    data: &'a [f32],
    num_classes: usize,
    num_boxes: usize,
}

impl<'a> TensorView<'a> {
    /// Wraps a flat buffer laid out as `[1, num_classes + 4, num_boxes]`.
    pub fn new(data: &'a [f32], num_classes: usize, num_boxes: usize) -> NutriScanResult<Self> {
        if num_classes == 0 || num_boxes == 0 {
            return Err(NutriScanError::InvalidDimensions {
                width: num_boxes,
                height: num_classes,
            });
        }
        let expected = num_classes
            .checked_add(BOX_CHANNELS)
            .and_then(|c| c.checked_mul(num_boxes))
            .ok_or(NutriScanError::InvalidDimensions {
                width: num_boxes,
                height: num_classes,
            })?;
        if data.len() != expected {
            return Err(NutriScanError::ShapeMismatch {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            num_classes,
            num_boxes,
        })
    }

    /// Wraps a buffer using a runtime-reported shape.
    ///
    /// Accepts `[1, C + 4, N]` or the batch-less `[C + 4, N]`.
    pub fn from_shape(data: &'a [f32], shape: &[usize]) -> NutriScanResult<Self> {
        let (channels, num_boxes) = match *shape {
            [1, channels, num_boxes] | [channels, num_boxes] => (channels, num_boxes),
            [batch, _, _] => {
                return Err(NutriScanError::ShapeMismatch {
                    expected: 1,
                    got: batch,
                })
            }
            _ => {
                return Err(NutriScanError::ShapeMismatch {
                    expected: 3,
                    got: shape.len(),
                })
            }
        };
        if channels <= BOX_CHANNELS {
            return Err(NutriScanError::InvalidDimensions {
                width: num_boxes,
                height: channels,
            });
        }
        Self::new(data, channels - BOX_CHANNELS, num_boxes)
    }

    /// Number of class score channels.
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Number of raw boxes.
    pub fn num_boxes(&self) -> usize {
        self.num_boxes
    }

    /// Returns the backing buffer.
    pub fn as_slice(&self) -> &'a [f32] {
        self.data
    }

    #[inline]
    fn at(&self, channel: usize, box_idx: usize) -> f32 {
        self.data[channel * self.num_boxes + box_idx]
    }

    /// Decodes the box at `box_idx`, or `None` if it fails the confidence gate.
    ///
    /// The best class is found with a strict `>` scan starting from a score of
    /// zero, so the lowest class index wins ties.
    pub fn candidate_at(&self, box_idx: usize) -> Option<Candidate> {
        if box_idx >= self.num_boxes {
            return None;
        }
        let mut best_score = 0.0f32;
        let mut best_class = None;
        for class in 0..self.num_classes {
            let score = self.at(class + BOX_CHANNELS, box_idx);
            if score > best_score {
                best_score = score;
                best_class = Some(class);
            }
        }

        let class_index = best_class?;
        if best_score <= CONFIDENCE_THRESHOLD {
            return None;
        }

        let bbox = BoundingBox::from_center(
            self.at(0, box_idx),
            self.at(1, box_idx),
            self.at(2, box_idx),
            self.at(3, box_idx),
        );
        Some(Candidate {
            bbox,
            class_index,
            score: best_score,
        })
    }
}

/// Decodes every box that passes the confidence gate, in box-index order.
pub fn decode_candidates(tensor: &TensorView<'_>) -> Vec<Candidate> {
    let _span = trace_span!(
        "decode",
        boxes = tensor.num_boxes(),
        classes = tensor.num_classes()
    )
    .entered();

    let out: Vec<Candidate> = (0..tensor.num_boxes())
        .filter_map(|i| tensor.candidate_at(i))
        .collect();

    trace_event!("decoded_candidates", count = out.len());
    out
}

#[cfg(test)]
mod tests {
    use super::{decode_candidates, TensorView, CONFIDENCE_THRESHOLD};
    use crate::util::NutriScanError;

    /// Builds a `[1, classes + 4, boxes]` buffer from per-box rows.
    fn tensor(rows: &[([f32; 4], &[f32])]) -> (Vec<f32>, usize, usize) {
        let boxes = rows.len();
        let classes = rows[0].1.len();
        let mut data = vec![0.0f32; (classes + 4) * boxes];
        for (i, (geom, scores)) in rows.iter().enumerate() {
            for k in 0..4 {
                data[k * boxes + i] = geom[k];
            }
            for (j, s) in scores.iter().enumerate() {
                data[(j + 4) * boxes + i] = *s;
            }
        }
        (data, classes, boxes)
    }

    #[test]
    fn rejects_length_mismatch() {
        let data = vec![0.0f32; 10];
        let err = TensorView::new(&data, 3, 2).unwrap_err();
        assert_eq!(
            err,
            NutriScanError::ShapeMismatch {
                expected: 14,
                got: 10
            }
        );
    }

    #[test]
    fn rejects_zero_dimensions() {
        let err = TensorView::new(&[], 0, 5).unwrap_err();
        assert!(matches!(err, NutriScanError::InvalidDimensions { .. }));
    }

    #[test]
    fn from_shape_accepts_batched_and_unbatched() {
        let data = vec![0.0f32; 7 * 3];
        let a = TensorView::from_shape(&data, &[1, 7, 3]).unwrap();
        let b = TensorView::from_shape(&data, &[7, 3]).unwrap();
        assert_eq!((a.num_classes(), a.num_boxes()), (3, 3));
        assert_eq!((b.num_classes(), b.num_boxes()), (3, 3));
    }

    #[test]
    fn from_shape_rejects_batches_and_missing_classes() {
        let data = vec![0.0f32; 14];
        assert!(TensorView::from_shape(&data, &[2, 7, 1]).is_err());
        let data = vec![0.0f32; 8];
        assert!(matches!(
            TensorView::from_shape(&data, &[1, 4, 2]),
            Err(NutriScanError::InvalidDimensions { .. })
        ));
        assert!(TensorView::from_shape(&data, &[8]).is_err());
    }

    #[test]
    fn confidence_gate_is_strict() {
        let (data, c, n) = tensor(&[
            ([0.5, 0.5, 0.2, 0.2], &[CONFIDENCE_THRESHOLD, 0.1]),
            ([0.5, 0.5, 0.2, 0.2], &[0.1, 0.50001]),
        ]);
        let view = TensorView::new(&data, c, n).unwrap();
        let out = decode_candidates(&view);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].class_index, 1);
        assert!((out[0].score - 0.50001).abs() < 1e-7);
    }

    #[test]
    fn argmax_ties_keep_lowest_class() {
        let (data, c, n) = tensor(&[([0.5, 0.5, 0.2, 0.2], &[0.3, 0.8, 0.8])]);
        let view = TensorView::new(&data, c, n).unwrap();
        let out = decode_candidates(&view);
        assert_eq!(out[0].class_index, 1);
    }

    #[test]
    fn converts_center_size_to_corners() {
        let (data, c, n) = tensor(&[
            ([0.1, 0.1, 0.2, 0.2], &[0.0]),
            ([0.25, 0.75, 0.5, 0.5], &[0.9]),
        ]);
        let view = TensorView::new(&data, c, n).unwrap();
        let out = decode_candidates(&view);
        assert_eq!(out.len(), 1);
        let b = out[0].bbox;
        assert!((b.left - 0.0).abs() < 1e-6);
        assert!((b.top - 0.5).abs() < 1e-6);
        assert!((b.right - 0.5).abs() < 1e-6);
        assert!((b.bottom - 1.0).abs() < 1e-6);
    }

    #[test]
    fn candidate_at_out_of_range_is_none() {
        let (data, c, n) = tensor(&[([0.5, 0.5, 0.2, 0.2], &[0.9])]);
        let view = TensorView::new(&data, c, n).unwrap();
        assert!(view.candidate_at(1).is_none());
    }
}
