// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Patch Score Aggregator
// ─────────────────────────────────────────────────────────────────────
//! Collapses per-patch probabilities into one image-level confidence.
//!
//! The percentile policy lets a few strongly suspicious patches carry the
//! decision even when most of the image looks clean. Interpolation is
//! linear between the two nearest ranks, the same convention as NumPy's
//! default `percentile`.

use provenance_types::detection::clamp_score;
use provenance_types::{Aggregation, ForensicVerdict, KernelError, KernelResult};

/// Aggregate `scores` under `policy`.
///
/// Empty input and non-finite values are errors. The result is clamped
/// to [0, 1].
pub fn aggregate(scores: &[f64], policy: Aggregation) -> KernelResult<f64> {
    if scores.is_empty() {
        return Err(KernelError::Numerical(
            "cannot aggregate zero patch scores".to_string(),
        ));
    }
    if let Some(bad) = scores.iter().find(|s| !s.is_finite()) {
        return Err(KernelError::Numerical(format!(
            "non-finite patch score {bad}"
        )));
    }

    let value = match policy {
        Aggregation::Mean => scores.iter().sum::<f64>() / scores.len() as f64,
        Aggregation::Percentile(p) => percentile(scores, p)?,
    };
    Ok(clamp_score(value, 0.0, 1.0))
}

/// Linear-interpolated percentile, `p` in [0, 100].
pub fn percentile(scores: &[f64], p: f64) -> KernelResult<f64> {
    if !p.is_finite() || !(0.0..=100.0).contains(&p) {
        return Err(KernelError::Numerical(format!(
            "percentile must be in [0, 100], got {p}"
        )));
    }
    if scores.is_empty() {
        return Err(KernelError::Numerical(
            "percentile of an empty set".to_string(),
        ));
    }

    let mut sorted = scores.to_vec();
    sorted.sort_by(f64::total_cmp);

    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    Ok(sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64))
}

/// Aggregate and apply the decision threshold.
pub fn verdict(scores: Vec<f64>, policy: Aggregation) -> KernelResult<ForensicVerdict> {
    let confidence = aggregate(&scores, policy)?;
    Ok(ForensicVerdict::new(confidence, scores))
}
