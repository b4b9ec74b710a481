//! Seam between the pipeline and whatever runtime executes the detector.

use crate::decode::TensorView;
use crate::image::preprocess::INPUT_SIZE;
use crate::util::NutriScanResult;

/// Raw output tensor returned by an inference runtime.
#[derive(Clone, Debug, PartialEq)]
pub struct RawOutput {
    data: Vec<f32>,
    shape: Vec<usize>,
}

impl RawOutput {
    /// Wraps a flat buffer and the shape reported by the runtime.
    ///
    /// The shape is checked when the output is viewed, not here.
    pub fn new(data: Vec<f32>, shape: Vec<usize>) -> Self {
        Self { data, shape }
    }

    /// Builds a `[1, num_classes + 4, num_boxes]` output.
    pub fn detection(data: Vec<f32>, num_classes: usize, num_boxes: usize) -> Self {
        Self::new(data, vec![1, num_classes + 4, num_boxes])
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Validates the shape and borrows the output as a detection tensor.
    pub fn view(&self) -> NutriScanResult<TensorView<'_>> {
        TensorView::from_shape(&self.data, &self.shape)
    }
}

/// A loaded detector that maps a preprocessed frame to a raw output tensor.
///
/// Input is NHWC `f32` in `[0, 1]` of side [`input_size`](Self::input_size).
/// Implementations that are not reentrant must serialize calls themselves.
pub trait InferenceModel: Send + Sync {
    /// Side length of the square input frame.
    fn input_size(&self) -> usize {
        INPUT_SIZE
    }

    /// Runs the detector on one preprocessed frame.
    fn infer(&self, input: &[f32]) -> NutriScanResult<RawOutput>;
}

impl<F> InferenceModel for F
where
    F: Fn(&[f32]) -> NutriScanResult<RawOutput> + Send + Sync,
{
    fn infer(&self, input: &[f32]) -> NutriScanResult<RawOutput> {
        self(input)
    }
}
