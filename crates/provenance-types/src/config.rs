// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Provenance Kernel Configuration
// ─────────────────────────────────────────────────────────────────────

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{KernelError, KernelResult};

/// Aggregation policy as spelled in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationKind {
    Mean,
    Percentile,
}

/// Resolved aggregation policy, with the percentile attached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Aggregation {
    /// Arithmetic mean of all patch probabilities.
    Mean,
    /// The given percentile in [0, 100], linearly interpolated.
    Percentile(f64),
}

/// Per-channel normalization applied after scaling pixels to [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Normalization {
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

/// Layer B classifier settings.
///
/// The field names match the JSON file shipped next to the model weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Side length of the square patch fed to the classifier.
    pub input_size: u32,

    /// Number of patches sampled per image (one inference each).
    pub num_patches: usize,

    /// How patch probabilities are collapsed into one confidence.
    pub aggregation: AggregationKind,

    /// Required when `aggregation` is `percentile`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentile: Option<f64>,

    /// Optional per-channel normalization. Absent: pixels stay in [0, 1].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalization: Option<Normalization>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            input_size: 224,
            num_patches: 10,
            aggregation: AggregationKind::Percentile,
            percentile: Some(90.0),
            normalization: None,
        }
    }
}

impl ClassifierConfig {
    /// Validate classifier parameters.
    pub fn validate(&self) -> KernelResult<()> {
        if self.input_size == 0 {
            return Err(KernelError::Config(
                "input_size must be > 0".to_string(),
            ));
        }
        if self.num_patches == 0 {
            return Err(KernelError::Config(
                "num_patches must be > 0".to_string(),
            ));
        }
        self.aggregation_policy()?;
        if let Some(norm) = &self.normalization {
            if norm.std.iter().any(|s| !s.is_finite() || *s <= 0.0) {
                return Err(KernelError::Config(format!(
                    "normalization std must be finite and > 0, got {:?}",
                    norm.std
                )));
            }
            if norm.mean.iter().any(|m| !m.is_finite()) {
                return Err(KernelError::Config(format!(
                    "normalization mean must be finite, got {:?}",
                    norm.mean
                )));
            }
        }
        Ok(())
    }

    /// Resolve `aggregation` + `percentile` into one policy value.
    pub fn aggregation_policy(&self) -> KernelResult<Aggregation> {
        match self.aggregation {
            AggregationKind::Mean => Ok(Aggregation::Mean),
            AggregationKind::Percentile => {
                let p = self.percentile.ok_or_else(|| {
                    KernelError::Config(
                        "percentile is required when aggregation is \"percentile\"".to_string(),
                    )
                })?;
                if !p.is_finite() || !(0.0..=100.0).contains(&p) {
                    return Err(KernelError::Config(format!(
                        "percentile must be in [0, 100], got {p}"
                    )));
                }
                Ok(Aggregation::Percentile(p))
            }
        }
    }
}

fn default_max_manifest_depth() -> usize {
    64
}

fn default_max_manifest_nodes() -> usize {
    100_000
}

/// Runtime configuration for the whole kernel.
///
/// Loaded once at startup and never mutated afterwards. The classifier
/// fields sit at the top level of the JSON object, next to the kernel
/// settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KernelConfig {
    #[serde(flatten)]
    pub classifier: ClassifierConfig,

    /// Deepest manifest nesting accepted by Layer A.
    #[serde(default = "default_max_manifest_depth")]
    pub max_manifest_depth: usize,

    /// Largest manifest (in tree nodes) accepted by Layer A.
    #[serde(default = "default_max_manifest_nodes")]
    pub max_manifest_nodes: usize,

    /// Directory for Layer B scratch files. Absent: the system temp dir.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scratch_dir: Option<PathBuf>,

    /// Wall-clock bound on Layer B in milliseconds. Absent: unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline_ms: Option<u64>,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            classifier: ClassifierConfig::default(),
            max_manifest_depth: default_max_manifest_depth(),
            max_manifest_nodes: default_max_manifest_nodes(),
            scratch_dir: None,
            deadline_ms: None,
        }
    }
}

impl KernelConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> KernelResult<()> {
        self.classifier.validate()?;
        if self.max_manifest_depth == 0 {
            return Err(KernelError::Config(
                "max_manifest_depth must be > 0".to_string(),
            ));
        }
        if self.max_manifest_nodes == 0 {
            return Err(KernelError::Config(
                "max_manifest_nodes must be > 0".to_string(),
            ));
        }
        if self.deadline_ms == Some(0) {
            return Err(KernelError::Config(
                "deadline_ms must be > 0 when set".to_string(),
            ));
        }
        Ok(())
    }

    /// Load from JSON string.
    pub fn from_json(json: &str) -> KernelResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| KernelError::Config(format!("JSON parse error: {e}")))
    }

    /// Read, parse and validate a config file.
    pub fn from_file(path: impl AsRef<Path>) -> KernelResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            KernelError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let config = Self::from_json(&json)?;
        config.validate()?;
        log::info!(
            "Loaded kernel config from {} (input_size={}, num_patches={}, aggregation={:?})",
            path.display(),
            config.classifier.input_size,
            config.classifier.num_patches,
            config.classifier.aggregation,
        );
        Ok(config)
    }
}
