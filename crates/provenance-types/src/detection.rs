// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Provenance Kernel Verdict Types
// ─────────────────────────────────────────────────────────────────────

use serde::{Deserialize, Serialize};

/// Confidence at or above which Layer B calls an image AI-generated.
pub const AI_THRESHOLD: f64 = 0.5;

/// Decimal digits kept on Layer B confidences in the final record.
pub const CONFIDENCE_DIGITS: i32 = 4;

/// Reason attached to every Layer B decision.
pub const FORENSIC_REASON: &str =
    "no explicit AI provenance found; decision based on CNN forensic analysis";

/// Clamp a value to [lo, hi], mapping NaN to lo and Inf to nearest bound.
#[inline]
pub fn clamp_score(value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_nan() {
        log::warn!("clamp_score: NaN detected, clamping to {lo:.4}");
        return lo;
    }
    if value.is_infinite() {
        let boundary = if value > 0.0 { hi } else { lo };
        log::warn!("clamp_score: Inf detected, clamping to {boundary:.4}");
        return boundary;
    }
    value.clamp(lo, hi)
}

/// Round to `CONFIDENCE_DIGITS` decimals, halves away from zero.
#[inline]
pub fn round_confidence(value: f64) -> f64 {
    let scale = 10f64.powi(CONFIDENCE_DIGITS);
    (value * scale).round() / scale
}

/// Which layer produced the final decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionLayer {
    #[serde(rename = "layer_a_metadata")]
    LayerAMetadata,
    #[serde(rename = "layer_b_cnn")]
    LayerBCnn,
}

impl DecisionLayer {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionLayer::LayerAMetadata => "layer_a_metadata",
            DecisionLayer::LayerBCnn => "layer_b_cnn",
        }
    }
}

/// Layer A outcome.
///
/// Confidence is binary: 1.0 when signed provenance claims AI generation,
/// 0.0 in every other case, including failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceVerdict {
    pub is_ai: bool,
    pub confidence: f64,
    pub reason: String,
    /// Allowlist terms found in the manifest, in allowlist order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matched_keywords: Vec<String>,
}

impl ProvenanceVerdict {
    /// A non-AI verdict with the given reason.
    pub fn negative(reason: impl Into<String>) -> Self {
        Self {
            is_ai: false,
            confidence: 0.0,
            reason: reason.into(),
            matched_keywords: Vec::new(),
        }
    }

    /// An AI claim backed by the matched allowlist terms.
    pub fn claimed(reason: impl Into<String>, matched_keywords: Vec<String>) -> Self {
        Self {
            is_ai: true,
            confidence: 1.0,
            reason: reason.into(),
            matched_keywords,
        }
    }
}

/// Layer B outcome before rounding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForensicVerdict {
    /// Aggregated confidence in [0, 1].
    pub confidence: f64,
    /// `confidence >= AI_THRESHOLD`.
    pub is_ai_generated: bool,
    /// Per-patch probabilities in sampling order.
    pub patch_probabilities: Vec<f64>,
}

impl ForensicVerdict {
    pub fn new(confidence: f64, patch_probabilities: Vec<f64>) -> Self {
        let confidence = clamp_score(confidence, 0.0, 1.0);
        Self {
            confidence,
            is_ai_generated: confidence >= AI_THRESHOLD,
            patch_probabilities,
        }
    }
}

/// Optional structured extras on a detection result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_keywords: Option<Vec<String>>,
}

/// Unified per-request result record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub is_ai_generated: bool,
    pub confidence: f64,
    pub decision_layer: DecisionLayer,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<DetectionDetails>,
}

impl DetectionResult {
    /// Short-circuit result for a Layer A AI claim.
    pub fn from_provenance(verdict: &ProvenanceVerdict) -> Self {
        Self {
            is_ai_generated: verdict.is_ai,
            confidence: verdict.confidence,
            decision_layer: DecisionLayer::LayerAMetadata,
            reason: verdict.reason.clone(),
            details: Some(DetectionDetails {
                matched_keywords: Some(verdict.matched_keywords.clone()),
            }),
        }
    }

    /// Layer B result; the confidence is rounded here and only here.
    pub fn from_forensic(verdict: &ForensicVerdict) -> Self {
        Self {
            is_ai_generated: verdict.is_ai_generated,
            confidence: round_confidence(verdict.confidence),
            decision_layer: DecisionLayer::LayerBCnn,
            reason: FORENSIC_REASON.to_string(),
            details: None,
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            log::error!("DetectionResult serialization failed: {e}");
            String::from("{}")
        })
    }
}
