// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Provenance Kernel Core Engine
// (C) 1998-2026 Miroslav Sotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
#![deny(unsafe_code)]
//! Two-layer gate deciding whether an image is AI-generated.
//!
//! - **Layer A** (`interpreter`): reads the signed C2PA manifest store and
//!   looks for an explicit AI-generation claim. Deterministic, binary.
//! - **Layer B** (`forensic`): samples random patches, scores each with a
//!   binary CNN and aggregates the probabilities.
//!
//! # Invariants
//!
//! 1. **Layer A never fails a request**: every provenance problem becomes
//!    a non-AI verdict with the detail in its reason.
//!
//! 2. **One layer per result**: Layer B runs only when Layer A made no
//!    claim, and the result names the layer that decided.
//!
//! 3. **Layer B never masks errors**: backend failures and non-finite
//!    probabilities reach the caller as errors, never as a score.
//!
//! 4. **Scratch files do not outlive the request**: the guard removes
//!    them on every exit path.

pub mod aggregate;
pub mod classifier;
pub mod forensic;
pub mod ingress;
pub mod interpreter;
pub mod keywords;
pub mod manifest;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod pipeline;
pub mod sampler;
pub mod scratch;
pub mod source;
pub mod tensor;

pub use aggregate::aggregate;
pub use classifier::{ExternalClassifier, ForensicBackend};
pub use forensic::ForensicDetector;
pub use interpreter::ManifestInterpreter;
pub use keywords::KeywordAllowlist;
pub use manifest::{ManifestLimits, ManifestNode};
#[cfg(feature = "onnx")]
pub use onnx::OnnxClassifier;
pub use pipeline::DetectionPipeline;
pub use sampler::sample_patches;
pub use scratch::ScratchFile;
#[cfg(feature = "c2pa")]
pub use source::C2paManifestSource;
pub use source::{
    default_source, ContainerFormat, ExternalManifestSource, ManifestSource, NoManifestSource,
};
