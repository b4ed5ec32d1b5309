// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Provenance Kernel Types
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Type definitions, configuration, and error hierarchy for the
//! Provenance Kernel, the AI-generated image gate for Director-Class AI.

pub mod config;
pub mod detection;
pub mod error;
pub mod payload;

pub use config::{Aggregation, AggregationKind, ClassifierConfig, KernelConfig, Normalization};
pub use detection::{
    DecisionLayer, DetectionDetails, DetectionResult, ForensicVerdict, ProvenanceVerdict,
};
pub use error::{KernelError, KernelResult};
pub use payload::{ContentType, ImageBytes};
