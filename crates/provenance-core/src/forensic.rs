// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Forensic Detector (Layer B)
// ─────────────────────────────────────────────────────────────────────
//! Patch-sampled forensic analysis.
//!
//! Samples `num_patches` random patches, runs the classifier on each one
//! in turn and aggregates the probabilities. When a deadline is set it is
//! checked before every forward pass.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use image::{ImageReader, RgbImage};
use rand::Rng;

use provenance_types::{
    Aggregation, ForensicVerdict, KernelConfig, KernelError, KernelResult, Normalization,
};

use crate::aggregate;
use crate::classifier::{checked_probability, ForensicBackend};
use crate::sampler::sample_patches;
use crate::tensor::patch_to_tensor;

/// Layer B engine. Immutable after construction; share it by reference.
pub struct ForensicDetector {
    backend: Arc<dyn ForensicBackend>,
    input_size: u32,
    num_patches: usize,
    aggregation: Aggregation,
    normalization: Option<Normalization>,
    deadline_ms: Option<u64>,
}

impl ForensicDetector {
    /// Build from a validated config.
    pub fn from_config(
        config: &KernelConfig,
        backend: Arc<dyn ForensicBackend>,
    ) -> KernelResult<Self> {
        config.validate()?;
        Ok(Self {
            backend,
            input_size: config.classifier.input_size,
            num_patches: config.classifier.num_patches,
            aggregation: config.classifier.aggregation_policy()?,
            normalization: config.classifier.normalization,
            deadline_ms: config.deadline_ms,
        })
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn aggregation(&self) -> Aggregation {
        self.aggregation
    }

    /// Classify a decoded image.
    pub fn analyze<R: Rng + ?Sized>(
        &self,
        image: &RgbImage,
        rng: &mut R,
    ) -> KernelResult<ForensicVerdict> {
        let start = Instant::now();
        let mut probabilities = Vec::with_capacity(self.num_patches);

        for patch in sample_patches(image, self.input_size, self.num_patches, rng) {
            if let Some(ms) = self.deadline_ms {
                if start.elapsed() >= Duration::from_millis(ms) {
                    log::warn!(
                        "Layer B deadline hit after {} of {} patches",
                        probabilities.len(),
                        self.num_patches
                    );
                    return Err(KernelError::Timeout { deadline_ms: ms });
                }
            }
            let tensor = patch_to_tensor(&patch, self.normalization.as_ref());
            let p = self.backend.probability(&tensor)?;
            probabilities.push(checked_probability(self.backend.name(), p)?);
        }

        let verdict = aggregate::verdict(probabilities, self.aggregation)?;
        log::debug!(
            "Layer B: {} patches via {}, confidence={:.4} ({:.1}ms)",
            verdict.patch_probabilities.len(),
            self.backend.name(),
            verdict.confidence,
            start.elapsed().as_secs_f64() * 1000.0,
        );
        Ok(verdict)
    }

    /// Decode `path` to RGB and classify it.
    ///
    /// The container format is sniffed from the file content, not the name.
    pub fn analyze_file<R: Rng + ?Sized>(
        &self,
        path: &Path,
        rng: &mut R,
    ) -> KernelResult<ForensicVerdict> {
        let image = ImageReader::open(path)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(|e| KernelError::ImageDecode(format!("{}: {e}", path.display())))?
            .decode()
            .map_err(|e| KernelError::ImageDecode(e.to_string()))?
            .to_rgb8();
        self.analyze(&image, rng)
    }
}
