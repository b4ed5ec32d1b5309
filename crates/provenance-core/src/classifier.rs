// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Forensic Classifier Interface
// ─────────────────────────────────────────────────────────────────────
//! Layer B backend trait and the closure-backed implementation.
//!
//! In production the patch classifier runs behind this trait, either via
//! ONNX Runtime embedded in Rust (`onnx` feature) or delegated to a host
//! runtime through [`ExternalClassifier`].

use ndarray::Array4;

use provenance_types::{KernelError, KernelResult};

/// Trait for patch classifiers.
///
/// `probability` receives one `[1, 3, S, S]` patch and returns
/// P(AI-generated) in [0, 1].
pub trait ForensicBackend: Send + Sync {
    fn name(&self) -> &str;

    fn probability(&self, patch: &Array4<f32>) -> KernelResult<f64>;
}

/// Logistic function mapping a raw logit to a probability.
#[inline]
pub fn sigmoid(logit: f64) -> f64 {
    1.0 / (1.0 + (-logit).exp())
}

/// Reject anything that is not a finite probability.
///
/// Never clamps: a backend producing garbage is an error, not a verdict.
pub fn checked_probability(backend: &str, p: f64) -> KernelResult<f64> {
    if !p.is_finite() {
        return Err(KernelError::Numerical(format!(
            "{backend} returned non-finite probability {p}"
        )));
    }
    if !(0.0..=1.0).contains(&p) {
        return Err(KernelError::Numerical(format!(
            "{backend} returned probability {p} outside [0, 1]"
        )));
    }
    Ok(p)
}

/// External classifier that calls a scoring function pointer.
///
/// Used by the PyO3 FFI layer to run inference in the host runtime
/// while keeping sampling and aggregation in Rust.
type ProbabilityFn = Box<dyn Fn(&Array4<f32>) -> KernelResult<f64> + Send + Sync>;

pub struct ExternalClassifier {
    probability_fn: ProbabilityFn,
}

impl ExternalClassifier {
    pub fn new(
        probability_fn: impl Fn(&Array4<f32>) -> KernelResult<f64> + Send + Sync + 'static,
    ) -> Self {
        Self {
            probability_fn: Box::new(probability_fn),
        }
    }
}

impl ForensicBackend for ExternalClassifier {
    fn name(&self) -> &str {
        "external"
    }

    fn probability(&self, patch: &Array4<f32>) -> KernelResult<f64> {
        (self.probability_fn)(patch)
    }
}
