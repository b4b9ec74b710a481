//! Candidate detections and their pruning.
//!
//! A [`Candidate`] is a box that passed the confidence gate but has not yet
//! been through non-maximum suppression.

pub mod nms;

use crate::geometry::BoundingBox;

/// Provisional detection produced by the tensor decoder.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    /// Box in normalized corner form.
    pub bbox: BoundingBox,
    /// Index into the class label list.
    pub class_index: usize,
    /// Best class score, strictly above the confidence gate.
    pub score: f32,
}
