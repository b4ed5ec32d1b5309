// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — ONNX Runtime Patch Classifier
// ─────────────────────────────────────────────────────────────────────
//! Single-logit binary classifier served by ONNX Runtime.
//!
//! The model is loaded once and checked against the expected layout
//! before the kernel accepts any request: one float input `[N, 3, S, S]`
//! and one output carrying a single logit per batch item. Dynamic
//! dimensions (`-1`) are accepted wherever a fixed one is expected.

use std::path::Path;

use ndarray::Array4;
use ort::session::Session;
use ort::value::{Tensor, ValueType};
use parking_lot::Mutex;

use provenance_types::{KernelError, KernelResult};

use crate::classifier::{checked_probability, sigmoid, ForensicBackend};

pub struct OnnxClassifier {
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
}

impl OnnxClassifier {
    /// Load `path` and verify it matches a `[N, 3, S, S] -> 1 logit` network.
    ///
    /// Any mismatch is fatal: the kernel must not start on wrong weights.
    pub fn load(path: impl AsRef<Path>, input_size: u32) -> KernelResult<Self> {
        let path = path.as_ref();
        log::info!("Loading forensic classifier from {}", path.display());

        let session = Session::builder()
            .map_err(|e| KernelError::ClassifierLoad(format!("session builder: {e}")))?
            .commit_from_file(path)
            .map_err(|e| {
                KernelError::ClassifierLoad(format!("cannot load {}: {e}", path.display()))
            })?;

        let (input_name, output_name) = check_architecture(&session, input_size)?;
        log::info!(
            "Forensic classifier ready (input={input_name}, output={output_name}, size={input_size})"
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
        })
    }
}

fn tensor_shape(kind: &ValueType, what: &str) -> KernelResult<Vec<i64>> {
    match kind {
        ValueType::Tensor { shape, .. } => Ok(shape.iter().copied().collect()),
        other => Err(KernelError::ClassifierLoad(format!(
            "{what} must be a tensor, found {other:?}"
        ))),
    }
}

fn dim_matches(actual: i64, expected: i64) -> bool {
    actual < 0 || actual == expected
}

fn check_architecture(session: &Session, input_size: u32) -> KernelResult<(String, String)> {
    let inputs = session.inputs();
    let outputs = session.outputs();
    if inputs.len() != 1 || outputs.len() != 1 {
        return Err(KernelError::ClassifierLoad(format!(
            "expected exactly one input and one output, found {} and {}",
            inputs.len(),
            outputs.len()
        )));
    }

    let input = &inputs[0];
    let shape = tensor_shape(input.dtype(), "input")?;
    let s = i64::from(input_size);
    let layout_ok = shape.len() == 4
        && dim_matches(shape[1], 3)
        && dim_matches(shape[2], s)
        && dim_matches(shape[3], s);
    if !layout_ok {
        return Err(KernelError::ClassifierLoad(format!(
            "input {} has shape {shape:?}, expected [N, 3, {s}, {s}]",
            input.name()
        )));
    }

    let output = &outputs[0];
    let shape = tensor_shape(output.dtype(), "output")?;
    let per_item: i64 = shape.iter().skip(1).map(|d| d.abs()).product();
    if shape.is_empty() || per_item != 1 {
        return Err(KernelError::ClassifierLoad(format!(
            "output {} has shape {shape:?}, expected a single logit per item",
            output.name()
        )));
    }

    Ok((input.name().to_string(), output.name().to_string()))
}

impl ForensicBackend for OnnxClassifier {
    fn name(&self) -> &str {
        "onnx"
    }

    fn probability(&self, patch: &Array4<f32>) -> KernelResult<f64> {
        let shape: Vec<i64> = patch.shape().iter().map(|&d| d as i64).collect();
        let data: Vec<f32> = patch.iter().copied().collect();
        let input = Tensor::from_array((shape, data))
            .map_err(|e| KernelError::Inference(format!("input tensor: {e}")))?;

        let logit = {
            let mut session = self.session.lock();
            let outputs = session
                .run(ort::inputs![self.input_name.as_str() => input])
                .map_err(|e| KernelError::Inference(format!("forward pass: {e}")))?;
            let output = outputs.get(self.output_name.as_str()).ok_or_else(|| {
                KernelError::Inference(format!("missing output {}", self.output_name))
            })?;
            let (_, values) = output
                .try_extract_tensor::<f32>()
                .map_err(|e| KernelError::Inference(format!("output tensor: {e}")))?;
            values
                .first()
                .copied()
                .ok_or_else(|| KernelError::Inference("empty output tensor".to_string()))?
        };

        checked_probability(self.name(), sigmoid(f64::from(logit)))
    }
}
