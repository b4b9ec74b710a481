//! Python bindings for the nutriscan detection post-processing library.
//!
//! This module exposes the tensor-level nutriscan API to Python via PyO3.

use numpy::{
    IntoPyArray, PyArray1, PyReadonlyArray1, PyReadonlyArray2, PyReadonlyArray3,
    PyReadonlyArrayDyn, PyUntypedArrayMethods,
};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use nutriscan::{
    ClassLabels, DetectionRecord as RustDetectionRecord, Detector as RustDetector,
    NutriScanError, NutritionTable, RgbView, TensorView,
};

/// Convert a NutriScanError to a Python exception.
///
/// Configuration and shape problems become `ValueError`; failures of an
/// otherwise valid call become `RuntimeError`.
fn to_py_err(err: NutriScanError) -> PyErr {
    match err {
        NutriScanError::ShapeMismatch { .. }
        | NutriScanError::InvalidDimensions { .. }
        | NutriScanError::BufferTooSmall { .. }
        | NutriScanError::InvalidStride { .. }
        | NutriScanError::InvalidLabels { .. }
        | NutriScanError::NutritionTable { .. } => PyValueError::new_err(err.to_string()),
        _ => PyRuntimeError::new_err(err.to_string()),
    }
}

type PyBox = (f32, f32, f32, f32);

/// One detected food item.
#[pyclass]
#[derive(Clone)]
pub struct FoodDetection {
    /// Display text, e.g. "Nasi putih".
    #[pyo3(get)]
    pub text: String,
    /// Raw class label used for the nutrition lookup.
    #[pyo3(get)]
    pub label: String,
    /// Index into the class label list.
    #[pyo3(get)]
    pub class_index: usize,
    /// Detector confidence.
    #[pyo3(get)]
    pub score: f32,
    /// Calories per portion.
    #[pyo3(get)]
    pub calories: u32,
    /// Portion description.
    #[pyo3(get)]
    pub portion: String,
    /// Normalized (left, top, right, bottom).
    #[pyo3(get)]
    pub bbox: PyBox,
}

#[pymethods]
impl FoodDetection {
    fn __repr__(&self) -> String {
        format!(
            "FoodDetection(text='{}', score={:.3}, calories={}, bbox=({:.3}, {:.3}, {:.3}, {:.3}))",
            self.text, self.score, self.calories, self.bbox.0, self.bbox.1, self.bbox.2, self.bbox.3
        )
    }
}

impl From<RustDetectionRecord> for FoodDetection {
    fn from(r: RustDetectionRecord) -> Self {
        Self {
            text: r.text,
            label: r.label,
            class_index: r.class_index,
            score: r.score,
            calories: r.calories,
            portion: r.portion,
            bbox: (r.bbox.left, r.bbox.top, r.bbox.right, r.bbox.bottom),
        }
    }
}

/// Result of one detection call.
#[pyclass]
#[derive(Clone)]
pub struct DetectionResult {
    /// Kept detections, highest score first.
    #[pyo3(get)]
    pub records: Vec<FoodDetection>,
    /// Wall-clock duration in milliseconds.
    #[pyo3(get)]
    pub elapsed_ms: u64,
    /// Sum of calories over all records.
    #[pyo3(get)]
    pub total_calories: u64,
}

#[pymethods]
impl DetectionResult {
    fn __len__(&self) -> usize {
        self.records.len()
    }

    fn __repr__(&self) -> String {
        format!(
            "DetectionResult(records={}, total_calories={}, elapsed_ms={})",
            self.records.len(),
            self.total_calories,
            self.elapsed_ms
        )
    }
}

/// Post-processor for one detector's output.
#[pyclass]
pub struct Detector {
    inner: RustDetector,
}

#[pymethods]
impl Detector {
    /// Create a detector.
    ///
    /// Args:
    ///     labels: Class labels in score-channel order
    ///     nutrition_json: JSON object mapping each label to
    ///         {"calories": int, "portion": str}
    ///     parallel: Decode on the rayon pool (default: False)
    ///     strict: Reject tables missing any label (default: False)
    #[new]
    #[pyo3(signature = (labels, nutrition_json, parallel = false, strict = false))]
    fn new(
        labels: Vec<String>,
        nutrition_json: &str,
        parallel: bool,
        strict: bool,
    ) -> PyResult<Self> {
        let labels = ClassLabels::new(labels).map_err(to_py_err)?;
        let table = NutritionTable::from_json_str(nutrition_json).map_err(to_py_err)?;
        let inner = RustDetector::builder(labels, table)
            .parallel(parallel)
            .require_complete_table(strict)
            .build()
            .map_err(to_py_err)?;
        Ok(Self { inner })
    }

    /// Post-process a raw detector output.
    ///
    /// Args:
    ///     tensor: float32 array shaped [1, C + 4, N] or [C + 4, N]
    ///
    /// Returns:
    ///     DetectionResult
    fn detect_tensor(&self, tensor: PyReadonlyArrayDyn<'_, f32>) -> PyResult<DetectionResult> {
        let shape = tensor.shape().to_vec();
        let data = tensor.as_slice()?;
        let view = TensorView::from_shape(data, &shape).map_err(to_py_err)?;
        let detection = self.inner.detect_tensor(&view).map_err(to_py_err)?;
        let total_calories = detection.total_calories();
        Ok(DetectionResult {
            records: detection.records.into_iter().map(FoodDetection::from).collect(),
            elapsed_ms: detection.elapsed_ms,
            total_calories,
        })
    }

    /// Number of classes.
    #[getter]
    fn num_classes(&self) -> usize {
        self.inner.labels().len()
    }

    fn __repr__(&self) -> String {
        format!(
            "Detector(num_classes={}, table_entries={})",
            self.inner.labels().len(),
            self.inner.table().len()
        )
    }
}

/// Intersection-over-Union of two (left, top, right, bottom) boxes.
#[pyfunction]
fn iou(a: PyBox, b: PyBox) -> f32 {
    let a = nutriscan::BoundingBox::new(a.0, a.1, a.2, a.3);
    let b = nutriscan::BoundingBox::new(b.0, b.1, b.2, b.3);
    nutriscan::iou(&a, &b)
}

/// Greedy non-maximum suppression.
///
/// Args:
///     boxes: Nx4 float32 array of (left, top, right, bottom)
///     scores: N-length float32 array
///     iou_threshold: Suppress boxes with IoU strictly above this (default: 0.5)
///
/// Returns:
///     Kept indices, highest score first
#[pyfunction]
#[pyo3(signature = (boxes, scores, iou_threshold = nutriscan::IOU_THRESHOLD))]
fn nms(
    boxes: PyReadonlyArray2<'_, f32>,
    scores: PyReadonlyArray1<'_, f32>,
    iou_threshold: f32,
) -> PyResult<Vec<usize>> {
    let shape = boxes.shape();
    if shape[1] != 4 {
        return Err(PyValueError::new_err("boxes must have shape (N, 4)"));
    }
    if shape[0] != scores.len() {
        return Err(PyValueError::new_err("boxes and scores must have the same length"));
    }
    let flat = boxes.as_slice()?;
    let rects: Vec<nutriscan::BoundingBox> = flat
        .chunks_exact(4)
        .map(|c| nutriscan::BoundingBox::new(c[0], c[1], c[2], c[3]))
        .collect();
    Ok(nutriscan::nms_indices(&rects, scores.as_slice()?, iou_threshold))
}

/// Display text for a raw label ("Ayam_Goreng" -> "Ayam goreng").
#[pyfunction]
fn display_text(label: &str) -> String {
    nutriscan::display_text(label)
}

/// Resize an RGB image to the detector input and scale it to [0, 1].
///
/// Args:
///     image: HxWx3 uint8 numpy array
///
/// Returns:
///     Flat float32 array of 320 * 320 * 3 NHWC values
#[pyfunction]
fn preprocess<'py>(
    py: Python<'py>,
    image: PyReadonlyArray3<'py, u8>,
) -> PyResult<Bound<'py, PyArray1<f32>>> {
    let shape = image.shape();
    if shape[2] != 3 {
        return Err(PyValueError::new_err("image must have shape (H, W, 3)"));
    }
    let (height, width) = (shape[0], shape[1]);
    let data = image.as_slice()?;
    let view = RgbView::from_slice(data, width, height).map_err(to_py_err)?;
    let input = nutriscan::image::preprocess::to_model_input(view);
    Ok(input.into_pyarray(py))
}

/// Python module for nutriscan.
#[pymodule]
fn _nutriscan(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<FoodDetection>()?;
    m.add_class::<DetectionResult>()?;
    m.add_class::<Detector>()?;
    m.add_function(wrap_pyfunction!(iou, m)?)?;
    m.add_function(wrap_pyfunction!(nms, m)?)?;
    m.add_function(wrap_pyfunction!(display_text, m)?)?;
    m.add_function(wrap_pyfunction!(preprocess, m)?)?;

    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    m.add("CONFIDENCE_THRESHOLD", nutriscan::CONFIDENCE_THRESHOLD)?;
    m.add("IOU_THRESHOLD", nutriscan::IOU_THRESHOLD)?;
    m.add("INPUT_SIZE", nutriscan::INPUT_SIZE)?;

    Ok(())
}
