//! Detection pipeline: decode, suppress, resolve, time.
//!
//! [`Detector`] is the explicitly constructed context for a detector model:
//! it owns the class labels and nutrition table (immutable, shared via `Arc`)
//! and optionally the model itself. Every call is self-contained; nothing
//! carries over between calls.

use crate::candidate::nms::{nms_candidates, IOU_THRESHOLD};
use crate::candidate::Candidate;
use crate::decode::{decode_candidates, TensorView};
use crate::geometry::BoundingBox;
use crate::image::preprocess::resize_normalize;
use crate::image::RgbView;
use crate::labels::ClassLabels;
use crate::model::{InferenceModel, RawOutput};
use crate::nutrition::{display_text, NutritionTable};
use crate::session::Ticket;
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::util::{NutriScanError, NutriScanResult};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// One detected food item with its nutrition data.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DetectionRecord {
    /// Box in normalized input-frame coordinates.
    pub bbox: BoundingBox,
    /// Human-readable label.
    pub text: String,
    /// Raw class label used for the nutrition lookup.
    pub label: String,
    /// Index of the class in the label list.
    pub class_index: usize,
    /// Detector confidence.
    pub score: f32,
    /// Calories per portion.
    pub calories: u32,
    /// Portion description.
    pub portion: String,
}

/// Result of one detection call.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Detection {
    /// Kept detections, highest score first.
    pub records: Vec<DetectionRecord>,
    /// Wall-clock duration of the call in milliseconds.
    pub elapsed_ms: u64,
}

impl Detection {
    /// Sum of calories over all records.
    pub fn total_calories(&self) -> u64 {
        self.records.iter().map(|r| u64::from(r.calories)).sum()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Builder for [`Detector`].
pub struct DetectorBuilder {
    labels: Arc<ClassLabels>,
    table: Arc<NutritionTable>,
    model: Option<Box<dyn InferenceModel>>,
    parallel: bool,
    require_complete_table: bool,
}

impl DetectorBuilder {
    /// Attaches the inference model used by [`Detector::detect`].
    pub fn model<M: InferenceModel + 'static>(mut self, model: M) -> Self {
        self.model = Some(Box::new(model));
        self
    }

    /// Attaches an already boxed model.
    pub fn boxed_model(mut self, model: Box<dyn InferenceModel>) -> Self {
        self.model = Some(model);
        self
    }

    /// Decodes on the rayon pool when the `rayon` feature is enabled.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Fails `build` if any class label lacks a nutrition entry.
    pub fn require_complete_table(mut self, require: bool) -> Self {
        self.require_complete_table = require;
        self
    }

    pub fn build(self) -> NutriScanResult<Detector> {
        if self.require_complete_table {
            self.table.check_labels(&self.labels)?;
        }
        if self.parallel && cfg!(not(feature = "rayon")) {
            trace_warn!("parallel decode requested without the `rayon` feature");
        }
        Ok(Detector {
            labels: self.labels,
            table: self.table,
            model: self.model,
            parallel: self.parallel,
        })
    }
}

/// Detection context for one model, its labels and its nutrition table.
pub struct Detector {
    labels: Arc<ClassLabels>,
    table: Arc<NutritionTable>,
    model: Option<Box<dyn InferenceModel>>,
    parallel: bool,
}

impl std::fmt::Debug for Detector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Detector")
            .field("labels", &self.labels)
            .field("table_len", &self.table.len())
            .field("has_model", &self.model.is_some())
            .field("parallel", &self.parallel)
            .finish()
    }
}

impl Detector {
    /// Starts building a detector from its labels and nutrition table.
    pub fn builder(
        labels: impl Into<Arc<ClassLabels>>,
        table: impl Into<Arc<NutritionTable>>,
    ) -> DetectorBuilder {
        DetectorBuilder {
            labels: labels.into(),
            table: table.into(),
            model: None,
            parallel: false,
            require_complete_table: false,
        }
    }

    /// Creates a detector without a model; only tensor entry points work.
    pub fn new(labels: impl Into<Arc<ClassLabels>>, table: impl Into<Arc<NutritionTable>>) -> Self {
        Self {
            labels: labels.into(),
            table: table.into(),
            model: None,
            parallel: false,
        }
    }

    pub fn labels(&self) -> &ClassLabels {
        &self.labels
    }

    pub fn table(&self) -> &NutritionTable {
        &self.table
    }

    /// True when a model is attached.
    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Runs the full pipeline on an RGB image.
    ///
    /// Fails with [`NutriScanError::ModelUnavailable`] when no model is
    /// attached. The elapsed time covers preprocessing, inference and
    /// post-processing.
    pub fn detect(&self, image: RgbView<'_>) -> NutriScanResult<Detection> {
        self.detect_image(image, None)
    }

    /// Like [`detect`](Self::detect), but stops with
    /// [`NutriScanError::Cancelled`] once `ticket` is superseded.
    pub fn detect_with_ticket(
        &self,
        image: RgbView<'_>,
        ticket: &Ticket,
    ) -> NutriScanResult<Detection> {
        self.detect_image(image, Some(ticket))
    }

    /// Post-processes a raw output, treating a missing output as an
    /// unavailable model.
    pub fn detect_output(&self, output: Option<&RawOutput>) -> NutriScanResult<Detection> {
        let start = Instant::now();
        let _span = trace_span!("detect", has_output = output.is_some()).entered();
        let output = output.ok_or(NutriScanError::ModelUnavailable)?;
        let tensor = output.view()?;
        let records = self.postprocess(&tensor, None)?;
        Ok(finish(records, start))
    }

    /// Post-processes an already validated tensor.
    pub fn detect_tensor(&self, tensor: &TensorView<'_>) -> NutriScanResult<Detection> {
        let start = Instant::now();
        let _span = trace_span!(
            "detect",
            boxes = tensor.num_boxes(),
            classes = tensor.num_classes()
        )
        .entered();
        let records = self.postprocess(tensor, None)?;
        Ok(finish(records, start))
    }

    fn detect_image(
        &self,
        image: RgbView<'_>,
        ticket: Option<&Ticket>,
    ) -> NutriScanResult<Detection> {
        let start = Instant::now();
        let _span = trace_span!("detect", width = image.width(), height = image.height()).entered();

        let model = self
            .model
            .as_deref()
            .ok_or(NutriScanError::ModelUnavailable)?;
        check(ticket)?;

        let input = resize_normalize(image, model.input_size());
        check(ticket)?;

        let output = model.infer(&input)?;
        check(ticket)?;

        let tensor = output.view()?;
        let records = self.postprocess(&tensor, ticket)?;
        Ok(finish(records, start))
    }

    fn postprocess(
        &self,
        tensor: &TensorView<'_>,
        ticket: Option<&Ticket>,
    ) -> NutriScanResult<Vec<DetectionRecord>> {
        if tensor.num_classes() != self.labels.len() {
            return Err(NutriScanError::ShapeMismatch {
                expected: self.labels.len(),
                got: tensor.num_classes(),
            });
        }

        let candidates = self.decode(tensor);
        check(ticket)?;

        let kept = {
            let _span = trace_span!("nms", candidates = candidates.len()).entered();
            let kept = nms_candidates(&candidates, IOU_THRESHOLD);
            trace_event!("nms_kept", count = kept.len());
            kept
        };
        check(ticket)?;

        let _span = trace_span!("resolve", kept = kept.len()).entered();
        kept.into_iter()
            .map(|idx| self.resolve(&candidates[idx]))
            .collect()
    }

    fn decode(&self, tensor: &TensorView<'_>) -> Vec<Candidate> {
        #[cfg(feature = "rayon")]
        if self.parallel {
            return crate::decode::rayon::decode_candidates_par(tensor);
        }
        decode_candidates(tensor)
    }

    fn resolve(&self, candidate: &Candidate) -> NutriScanResult<DetectionRecord> {
        let label = self
            .labels
            .get(candidate.class_index)
            .ok_or(NutriScanError::ShapeMismatch {
                expected: self.labels.len(),
                got: candidate.class_index + 1,
            })?;
        let entry = self.table.resolve(label)?;
        Ok(DetectionRecord {
            bbox: candidate.bbox,
            text: display_text(label),
            label: label.to_string(),
            class_index: candidate.class_index,
            score: candidate.score,
            calories: entry.calories,
            portion: entry.portion.clone(),
        })
    }
}

fn check(ticket: Option<&Ticket>) -> NutriScanResult<()> {
    match ticket {
        Some(ticket) => ticket.ensure_current(),
        None => Ok(()),
    }
}

fn finish(records: Vec<DetectionRecord>, start: Instant) -> Detection {
    let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
    trace_event!("detection_done", records = records.len(), elapsed_ms = elapsed_ms);
    Detection {
        records,
        elapsed_ms,
    }
}
