//! NutriScan turns raw object-detector output into labeled food items with
//! calorie estimates.
//!
//! The core is CPU-only post-processing of a `[1, C + 4, N]` detector tensor:
//! a fixed confidence gate, greedy IoU non-maximum suppression, and a lookup
//! into a nutrition table. Image preprocessing and an [`InferenceModel`] seam
//! are provided for running the whole pipeline from an RGB image, with
//! optional parallel decoding via the `rayon` feature.

pub mod candidate;
pub mod decode;
pub mod geometry;
pub mod image;
pub mod labels;
pub mod model;
pub mod nutrition;
pub mod pipeline;
pub mod session;
mod trace;
pub mod util;

#[cfg(feature = "image-io")]
pub use image::io;

pub use candidate::nms::{nms_candidates, nms_indices, IOU_THRESHOLD};
pub use candidate::Candidate;
pub use decode::{decode_candidates, TensorView, CONFIDENCE_THRESHOLD};
pub use geometry::{iou, BoundingBox};
pub use image::preprocess::{INPUT_SIZE, PIXEL_SCALE};
pub use image::{OwnedRgbImage, RgbView};
pub use labels::{ClassLabels, DEFAULT_FOOD_LABELS};
pub use model::{InferenceModel, RawOutput};
pub use nutrition::{display_text, NutritionEntry, NutritionTable};
pub use pipeline::{Detection, DetectionRecord, Detector, DetectorBuilder};
pub use session::{DetectionSession, Ticket};
pub use util::{NutriScanError, NutriScanResult};

#[cfg(feature = "rayon")]
pub use decode::rayon::decode_candidates_par;

/// Raw box count of the bundled 320x320 food detector.
pub const DEFAULT_NUM_BOXES: usize = 2100;
