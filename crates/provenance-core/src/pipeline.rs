// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Detection Pipeline (Decision Orchestrator)
// ─────────────────────────────────────────────────────────────────────
//! Combines the two layers into one decision per image.
//!
//! Layer A runs first. A signed AI-generation claim ends the request
//! there with full confidence. Otherwise the bytes are copied to a scratch
//! file and Layer B decides. Exactly one layer is reported per result.
//!
//! The pipeline is built once at startup and holds no mutable state, so a
//! single `Arc<DetectionPipeline>` serves every worker.

use std::path::PathBuf;
use std::sync::Arc;

use rand::Rng;

use provenance_types::{
    DetectionResult, ImageBytes, KernelConfig, KernelResult, ProvenanceVerdict,
};

use crate::classifier::ForensicBackend;
use crate::forensic::ForensicDetector;
use crate::interpreter::ManifestInterpreter;
use crate::scratch::ScratchFile;
use crate::source::ManifestSource;

pub struct DetectionPipeline {
    interpreter: ManifestInterpreter,
    forensic: ForensicDetector,
    scratch_dir: Option<PathBuf>,
}

impl DetectionPipeline {
    /// Assemble a pipeline. Fails on an invalid config.
    pub fn new(
        config: &KernelConfig,
        source: Arc<dyn ManifestSource>,
        backend: Arc<dyn ForensicBackend>,
    ) -> KernelResult<Self> {
        let forensic = ForensicDetector::from_config(config, backend)?;
        let interpreter = ManifestInterpreter::from_config(config, source);
        log::info!(
            "Detection pipeline ready (manifest source={}, classifier={}, aggregation={:?})",
            interpreter.source_name(),
            forensic.backend_name(),
            forensic.aggregation(),
        );
        Ok(Self {
            interpreter,
            forensic,
            scratch_dir: config.scratch_dir.clone(),
        })
    }

    /// Production bootstrap: the build's default manifest source plus an
    /// ONNX classifier loaded and checked from `model_path`.
    #[cfg(feature = "onnx")]
    pub fn with_onnx_model(
        config: &KernelConfig,
        model_path: impl AsRef<std::path::Path>,
    ) -> KernelResult<Self> {
        config.validate()?;
        let classifier =
            crate::onnx::OnnxClassifier::load(model_path, config.classifier.input_size)?;
        Self::new(config, crate::source::default_source(), Arc::new(classifier))
    }

    /// Classify one image using the thread-local random generator.
    pub fn detect(&self, image: &ImageBytes) -> KernelResult<DetectionResult> {
        self.detect_with_rng(image, &mut rand::thread_rng())
    }

    /// Classify one image, drawing patch positions from `rng`.
    pub fn detect_with_rng<R: Rng + ?Sized>(
        &self,
        image: &ImageBytes,
        rng: &mut R,
    ) -> KernelResult<DetectionResult> {
        let provenance = self.interpreter.check(image.bytes());
        if provenance.is_ai {
            return Ok(DetectionResult::from_provenance(&provenance));
        }
        log::debug!("Layer A inconclusive ({}), running Layer B", provenance.reason);

        let scratch =
            ScratchFile::create(self.scratch_dir.as_deref(), image.content_type(), image.bytes())?;
        let verdict = self.forensic.analyze_file(scratch.path(), rng)?;
        Ok(DetectionResult::from_forensic(&verdict))
    }

    /// Layer A alone.
    pub fn check_provenance(&self, bytes: &[u8]) -> ProvenanceVerdict {
        self.interpreter.check(bytes)
    }
}
