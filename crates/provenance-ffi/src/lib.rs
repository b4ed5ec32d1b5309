// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Provenance Kernel PyO3 FFI Bindings
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
// Note: #[deny(unsafe_code)] not applied; PyO3 proc macros generate
// unsafe blocks internally. All hand-written code in this crate is safe.
//! Python-callable wrappers around the Provenance Kernel.
//!
//! The HTTP service stays in Python; it hands each upload to
//! `Detector.detect(data, content_type)` and returns the dict it gets back.
//!
//! # FFI Safety
//!
//! - The GIL is released while a request runs and re-acquired via
//!   `Python::with_gil` for every Python callback.
//! - Python exceptions in callbacks become kernel errors: a manifest
//!   callback failure is a Layer A fail-safe, a classifier callback
//!   failure is a Layer B inference error.
//! - Client errors raise `ValueError`, everything else `RuntimeError`.
//!
//! Usage from Python:
//! ```python
//! from provenance_kernel import Detector, KernelConfig
//!
//! detector = Detector(KernelConfig.from_json(open("layer_b.json").read()),
//!                     model_path="forensic.onnx")
//! result = detector.detect(upload_bytes, "image/png")
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;

use provenance_core::{
    aggregate, default_source, ingress, DetectionPipeline, ExternalClassifier,
    ExternalManifestSource, ForensicBackend, KeywordAllowlist, ManifestInterpreter,
    ManifestLimits, ManifestSource,
};
use provenance_types::{
    Aggregation, AggregationKind, DetectionResult, KernelConfig, KernelError, ProvenanceVerdict,
};

fn to_py_err(e: KernelError) -> PyErr {
    if e.is_client_error() {
        PyValueError::new_err(e.to_string())
    } else {
        PyRuntimeError::new_err(e.to_string())
    }
}

fn parse_aggregation(name: &str) -> PyResult<AggregationKind> {
    match name.to_ascii_lowercase().as_str() {
        "mean" => Ok(AggregationKind::Mean),
        "percentile" => Ok(AggregationKind::Percentile),
        other => Err(PyValueError::new_err(format!(
            "aggregation must be \"mean\" or \"percentile\", got {other:?}"
        ))),
    }
}

// ─── PyKernelConfig ─────────────────────────────────────────────────

/// Python-visible configuration for the Provenance Kernel.
#[pyclass(name = "KernelConfig")]
#[derive(Clone)]
struct PyKernelConfig {
    inner: KernelConfig,
}

#[pymethods]
impl PyKernelConfig {
    #[new]
    #[pyo3(signature = (
        input_size = 224,
        num_patches = 10,
        aggregation = "percentile",
        percentile = Some(90.0),
        max_manifest_depth = 64,
        max_manifest_nodes = 100_000,
        scratch_dir = None,
        deadline_ms = None,
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        input_size: u32,
        num_patches: usize,
        aggregation: &str,
        percentile: Option<f64>,
        max_manifest_depth: usize,
        max_manifest_nodes: usize,
        scratch_dir: Option<PathBuf>,
        deadline_ms: Option<u64>,
    ) -> PyResult<Self> {
        let mut config = KernelConfig {
            max_manifest_depth,
            max_manifest_nodes,
            scratch_dir,
            deadline_ms,
            ..KernelConfig::default()
        };
        config.classifier.input_size = input_size;
        config.classifier.num_patches = num_patches;
        config.classifier.aggregation = parse_aggregation(aggregation)?;
        config.classifier.percentile = percentile;
        config
            .validate()
            .map_err(|e| PyValueError::new_err(e.to_string()))?;
        Ok(Self { inner: config })
    }

    /// Construct from JSON string.
    #[staticmethod]
    fn from_json(json: &str) -> PyResult<Self> {
        let config =
            KernelConfig::from_json(json).map_err(|e| PyValueError::new_err(e.to_string()))?;
        config
            .validate()
            .map_err(|e| PyValueError::new_err(e.to_string()))?;
        Ok(Self { inner: config })
    }

    /// Read and validate a JSON config file.
    #[staticmethod]
    fn from_file(path: PathBuf) -> PyResult<Self> {
        let config =
            KernelConfig::from_file(&path).map_err(|e| PyValueError::new_err(e.to_string()))?;
        Ok(Self { inner: config })
    }

    fn validate(&self) -> PyResult<()> {
        self.inner
            .validate()
            .map_err(|e| PyValueError::new_err(e.to_string()))
    }

    fn to_json(&self) -> PyResult<String> {
        serde_json::to_string(&self.inner).map_err(|e| PyRuntimeError::new_err(e.to_string()))
    }

    #[getter]
    fn input_size(&self) -> u32 {
        self.inner.classifier.input_size
    }

    #[getter]
    fn num_patches(&self) -> usize {
        self.inner.classifier.num_patches
    }

    #[getter]
    fn deadline_ms(&self) -> Option<u64> {
        self.inner.deadline_ms
    }

    fn __repr__(&self) -> String {
        format!(
            "KernelConfig(input_size={}, num_patches={}, aggregation={:?}, percentile={:?})",
            self.inner.classifier.input_size,
            self.inner.classifier.num_patches,
            self.inner.classifier.aggregation,
            self.inner.classifier.percentile,
        )
    }
}

// ─── Callback adapters ──────────────────────────────────────────────

/// Manifest source backed by `callback(data: bytes, mime: str) -> str`.
fn python_manifest_source(callback: PyObject) -> Arc<dyn ManifestSource> {
    Arc::new(ExternalManifestSource::new(move |format, bytes| {
        Python::with_gil(|py| {
            callback
                .call1(py, (bytes, format.mime()))
                .and_then(|result| result.extract::<String>(py))
                .map_err(|e| KernelError::Provenance(e.to_string()))
        })
    }))
}

/// Classifier backed by `callback(values: list[float], shape: list[int]) -> float`.
///
/// `values` is the patch tensor flattened in NCHW order.
fn python_classifier(callback: PyObject) -> Arc<dyn ForensicBackend> {
    Arc::new(ExternalClassifier::new(move |patch| {
        let shape: Vec<usize> = patch.shape().to_vec();
        let values: Vec<f32> = patch.iter().copied().collect();
        Python::with_gil(|py| {
            callback
                .call1(py, (values, shape))
                .and_then(|result| result.extract::<f64>(py))
                .map_err(|e| KernelError::Inference(format!("classifier callback: {e}")))
        })
    }))
}

fn manifest_source_or_default(callback: Option<PyObject>) -> Arc<dyn ManifestSource> {
    match callback {
        Some(cb) => python_manifest_source(cb),
        None => default_source(),
    }
}

fn verdict_to_dict<'py>(
    py: Python<'py>,
    verdict: &ProvenanceVerdict,
) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    dict.set_item("is_ai", verdict.is_ai)?;
    dict.set_item("confidence", verdict.confidence)?;
    dict.set_item("reason", &verdict.reason)?;
    dict.set_item("matched_keywords", &verdict.matched_keywords)?;
    Ok(dict)
}

fn result_to_dict<'py>(
    py: Python<'py>,
    result: &DetectionResult,
) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    dict.set_item("is_ai_generated", result.is_ai_generated)?;
    dict.set_item("confidence", result.confidence)?;
    dict.set_item("decision_layer", result.decision_layer.as_str())?;
    dict.set_item("reason", &result.reason)?;
    if let Some(details) = &result.details {
        let extra = PyDict::new(py);
        if let Some(keywords) = &details.matched_keywords {
            extra.set_item("matched_keywords", keywords)?;
        }
        dict.set_item("details", extra)?;
    }
    Ok(dict)
}

// ─── Detector ───────────────────────────────────────────────────────

/// Two-layer AI-generated image detector.
///
/// Build once at startup and share across request handlers.
#[pyclass(name = "Detector", frozen)]
struct PyDetector {
    inner: Arc<DetectionPipeline>,
}

#[pymethods]
impl PyDetector {
    /// Create a detector.
    ///
    /// Args:
    ///     config: Optional KernelConfig (uses defaults if None).
    ///     model_path: ONNX classifier weights (needs the `onnx` build).
    ///     classifier_callback: Optional Callable[[list[float], list[int]], float]
    ///                          returning P(AI) for one patch. Takes
    ///                          precedence over model_path.
    ///     manifest_callback: Optional Callable[[bytes, str], str] returning
    ///                        the C2PA manifest store JSON. If None, the
    ///                        built-in C2PA reader is used.
    #[new]
    #[pyo3(signature = (config = None, model_path = None, classifier_callback = None, manifest_callback = None))]
    fn new(
        config: Option<PyKernelConfig>,
        model_path: Option<PathBuf>,
        classifier_callback: Option<PyObject>,
        manifest_callback: Option<PyObject>,
    ) -> PyResult<Self> {
        let cfg = config.map(|c| c.inner).unwrap_or_default();
        let source = manifest_source_or_default(manifest_callback);

        let backend: Arc<dyn ForensicBackend> = match (classifier_callback, model_path) {
            (Some(cb), _) => python_classifier(cb),
            (None, Some(path)) => load_model(&path, cfg.classifier.input_size)?,
            (None, None) => {
                return Err(PyValueError::new_err(
                    "either model_path or classifier_callback is required",
                ))
            }
        };

        let pipeline = DetectionPipeline::new(&cfg, source, backend).map_err(to_py_err)?;
        Ok(Self {
            inner: Arc::new(pipeline),
        })
    }

    /// Classify one upload.
    ///
    /// Raises ValueError for a rejected content type or empty payload and
    /// RuntimeError when Layer B fails.
    fn detect<'py>(
        &self,
        py: Python<'py>,
        data: &[u8],
        content_type: &str,
    ) -> PyResult<Bound<'py, PyDict>> {
        let result = self.run(py, data, content_type)?;
        result_to_dict(py, &result)
    }

    /// Same as `detect`, serialized to a JSON string.
    fn detect_json(&self, py: Python<'_>, data: &[u8], content_type: &str) -> PyResult<String> {
        Ok(self.run(py, data, content_type)?.to_json())
    }

    /// Layer A alone.
    fn check_metadata<'py>(&self, py: Python<'py>, data: &[u8]) -> PyResult<Bound<'py, PyDict>> {
        verdict_to_dict(py, &self.inner.check_provenance(data))
    }
}

impl PyDetector {
    /// Ingress gate, then the full pipeline with the GIL released.
    fn run(&self, py: Python<'_>, data: &[u8], content_type: &str) -> PyResult<DetectionResult> {
        let image = ingress::accept(content_type, data.to_vec()).map_err(to_py_err)?;
        let pipeline = Arc::clone(&self.inner);
        py.allow_threads(move || pipeline.detect(&image))
            .map_err(to_py_err)
    }
}

#[cfg(feature = "onnx")]
fn load_model(path: &std::path::Path, input_size: u32) -> PyResult<Arc<dyn ForensicBackend>> {
    let classifier = provenance_core::OnnxClassifier::load(path, input_size).map_err(to_py_err)?;
    Ok(Arc::new(classifier))
}

#[cfg(not(feature = "onnx"))]
fn load_model(path: &std::path::Path, _input_size: u32) -> PyResult<Arc<dyn ForensicBackend>> {
    Err(PyRuntimeError::new_err(format!(
        "cannot load {}: provenance_kernel was built without the onnx feature",
        path.display()
    )))
}

// ─── Module-level helpers ───────────────────────────────────────────

/// Run Layer A on raw image bytes.
///
/// Never raises for bad input: every failure is a non-AI verdict.
#[pyfunction]
#[pyo3(signature = (data, manifest_callback = None))]
fn check_metadata<'py>(
    py: Python<'py>,
    data: &[u8],
    manifest_callback: Option<PyObject>,
) -> PyResult<Bound<'py, PyDict>> {
    let interpreter = ManifestInterpreter::new(
        manifest_source_or_default(manifest_callback),
        KeywordAllowlist::default(),
        ManifestLimits::default(),
    );
    verdict_to_dict(py, &interpreter.check(data))
}

/// Collapse patch probabilities into one confidence.
#[pyfunction]
#[pyo3(signature = (probs, aggregation = "mean", percentile = None))]
fn aggregate_scores(probs: Vec<f64>, aggregation: &str, percentile: Option<f64>) -> PyResult<f64> {
    let policy = match parse_aggregation(aggregation)? {
        AggregationKind::Mean => Aggregation::Mean,
        AggregationKind::Percentile => Aggregation::Percentile(percentile.ok_or_else(|| {
            PyValueError::new_err("percentile is required when aggregation is \"percentile\"")
        })?),
    };
    aggregate(&probs, policy).map_err(|e| PyValueError::new_err(e.to_string()))
}

#[pymodule]
fn provenance_kernel(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyKernelConfig>()?;
    m.add_class::<PyDetector>()?;
    m.add_function(wrap_pyfunction!(check_metadata, m)?)?;
    m.add_function(wrap_pyfunction!(aggregate_scores, m)?)?;
    m.add("AI_KEYWORDS", provenance_core::keywords::AI_KEYWORDS.to_vec())?;
    Ok(())
}
