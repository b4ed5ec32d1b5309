// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Manifest Interpreter (Layer A)
// ─────────────────────────────────────────────────────────────────────
//! Deterministic provenance check.
//!
//! Layer A fires only when the image itself declares AI generation in
//! cryptographically signed C2PA provenance. It never guesses: a missing,
//! corrupt or unverifiable container resolves to "not AI" with the failure
//! detail kept in the reason. Confidence is 0.0 or 1.0, nothing between.

use std::sync::Arc;

use provenance_types::{KernelConfig, KernelResult, ProvenanceVerdict};

use crate::keywords::KeywordAllowlist;
use crate::manifest::{ManifestLimits, ManifestNode};
use crate::source::{ContainerFormat, ManifestSource};

pub const REASON_UNSUPPORTED: &str = "unsupported format for C2PA provenance";
pub const REASON_NO_PROVENANCE: &str = "no C2PA provenance data found";
pub const REASON_AI_CLAIM: &str =
    "explicit AI-generation claim in signed C2PA provenance";
pub const REASON_NO_CLAIM: &str = "C2PA provenance present, no AI-generation claim";
pub const REASON_FAILURE_PREFIX: &str = "metadata analysis failed";

/// Layer A: C2PA provenance interpreter.
pub struct ManifestInterpreter {
    source: Arc<dyn ManifestSource>,
    allowlist: KeywordAllowlist,
    limits: ManifestLimits,
}

impl ManifestInterpreter {
    pub fn new(
        source: Arc<dyn ManifestSource>,
        allowlist: KeywordAllowlist,
        limits: ManifestLimits,
    ) -> Self {
        Self {
            source,
            allowlist,
            limits,
        }
    }

    /// Interpreter with the shipped allowlist and the config's bounds.
    pub fn from_config(config: &KernelConfig, source: Arc<dyn ManifestSource>) -> Self {
        Self::new(
            source,
            KeywordAllowlist::default(),
            ManifestLimits {
                max_depth: config.max_manifest_depth,
                max_nodes: config.max_manifest_nodes,
            },
        )
    }

    /// Evaluate the provenance embedded in `bytes`.
    ///
    /// Never fails: every error inside Layer A becomes a negative verdict.
    pub fn check(&self, bytes: &[u8]) -> ProvenanceVerdict {
        let Some(format) = ContainerFormat::sniff(bytes) else {
            log::debug!("Layer A: unrecognised byte signature");
            return ProvenanceVerdict::negative(REASON_UNSUPPORTED);
        };

        match self.evaluate(format, bytes) {
            Ok(verdict) => verdict,
            Err(e) => {
                log::info!("Layer A: {} source failed safe: {e}", self.source.name());
                ProvenanceVerdict::negative(format!("{REASON_FAILURE_PREFIX}: {e}"))
            }
        }
    }

    fn evaluate(&self, format: ContainerFormat, bytes: &[u8]) -> KernelResult<ProvenanceVerdict> {
        let json = self.source.read_manifest(format, bytes)?;
        let manifest = ManifestNode::parse(&json, &self.limits)?;
        if manifest.is_empty() {
            return Ok(ProvenanceVerdict::negative(REASON_NO_PROVENANCE));
        }

        let strings = manifest.collect_text(&self.limits)?;
        let matched = self.allowlist.find_matches(&strings);
        if matched.is_empty() {
            log::debug!("Layer A: {} text leaves, no allowlist term", strings.len());
            return Ok(ProvenanceVerdict::negative(REASON_NO_CLAIM));
        }

        log::info!("Layer A: signed AI-generation claim, matched {matched:?}");
        Ok(ProvenanceVerdict::claimed(REASON_AI_CLAIM, matched))
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    pub fn allowlist(&self) -> &KeywordAllowlist {
        &self.allowlist
    }

    pub fn limits(&self) -> &ManifestLimits {
        &self.limits
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use provenance_types::KernelError;

    use super::*;
    use crate::source::ExternalManifestSource;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR";
    const JPEG: &[u8] = &[0xff, 0xd8, 0xff, 0xe1, 0x00, 0x10];

    fn interpreter_with(json: &'static str) -> ManifestInterpreter {
        ManifestInterpreter::new(
            Arc::new(ExternalManifestSource::new(move |_, _| Ok(json.to_string()))),
            KeywordAllowlist::default(),
            ManifestLimits::default(),
        )
    }

    #[test]
    fn test_unsupported_format_skips_source() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let interpreter = ManifestInterpreter::new(
            Arc::new(ExternalManifestSource::new(move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok("{}".to_string())
            })),
            KeywordAllowlist::default(),
            ManifestLimits::default(),
        );
        let verdict = interpreter.check(b"GIF89a....");
        assert!(!verdict.is_ai);
        assert_eq!(verdict.confidence, 0.0);
        assert_eq!(verdict.reason, REASON_UNSUPPORTED);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_source_failure_is_fail_safe() {
        let interpreter = ManifestInterpreter::new(
            Arc::new(ExternalManifestSource::new(|_, _| {
                Err(KernelError::Provenance("claim signature mismatch".into()))
            })),
            KeywordAllowlist::default(),
            ManifestLimits::default(),
        );
        let verdict = interpreter.check(JPEG);
        assert!(!verdict.is_ai);
        assert_eq!(verdict.confidence, 0.0);
        assert!(verdict.reason.starts_with(REASON_FAILURE_PREFIX));
        assert!(verdict.reason.contains("claim signature mismatch"));
    }

    #[test]
    fn test_malformed_json_is_fail_safe() {
        let verdict = interpreter_with("{\"manifests\": [").check(PNG);
        assert!(!verdict.is_ai);
        assert!(verdict.reason.starts_with(REASON_FAILURE_PREFIX));
    }

    #[test]
    fn test_empty_manifest() {
        for json in ["{}", "", "[]", "null"] {
            let verdict = interpreter_with(json).check(PNG);
            assert!(!verdict.is_ai);
            assert_eq!(verdict.reason, REASON_NO_PROVENANCE, "json={json:?}");
        }
    }

    #[test]
    fn test_ai_claim() {
        let verdict = interpreter_with(
            r#"{"active_manifest": "urn:1", "manifests": {"urn:1": {
                "claim_generator": "Generated with Stable Diffusion",
                "assertions": [{"label": "c2pa.actions",
                    "data": {"actions": [{"action": "c2pa.created",
                        "digitalSourceType": "http://cv.iptc.org/newscodes/digitalsourcetype/trainedAlgorithmicMedia"}]}}]
            }}}"#,
        )
        .check(PNG);
        assert!(verdict.is_ai);
        assert_eq!(verdict.confidence, 1.0);
        assert_eq!(verdict.reason, REASON_AI_CLAIM);
        assert_eq!(verdict.matched_keywords, vec!["stable diffusion"]);
    }

    #[test]
    fn test_provenance_without_claim() {
        let verdict = interpreter_with(
            r#"{"manifests": {"urn:2": {"claim_generator": "Adobe_Photoshop/25.0",
                "assertions": [{"label": "c2pa.actions", "data": {"actions": [{"action": "c2pa.edited"}]}}]}}}"#,
        )
        .check(JPEG);
        assert!(!verdict.is_ai);
        assert_eq!(verdict.confidence, 0.0);
        assert_eq!(verdict.reason, REASON_NO_CLAIM);
        assert!(verdict.matched_keywords.is_empty());
    }

    #[test]
    fn test_keyword_only_in_key_does_not_match() {
        let verdict = interpreter_with(r#"{"midjourney": "camera capture"}"#).check(PNG);
        assert!(!verdict.is_ai);
    }

    #[test]
    fn test_over_limit_manifest_is_fail_safe() {
        let interpreter = ManifestInterpreter::new(
            Arc::new(ExternalManifestSource::new(|_, _| {
                Ok(r#"[[[[[["made with firefly"]]]]]]"#.to_string())
            })),
            KeywordAllowlist::default(),
            ManifestLimits {
                max_depth: 3,
                max_nodes: 100,
            },
        );
        let verdict = interpreter.check(PNG);
        assert!(!verdict.is_ai);
        assert!(verdict.reason.contains("depth limit"));
    }

    #[test]
    fn test_idempotent() {
        let interpreter = interpreter_with(r#"{"a": ["DALL-E 3", {"b": "OpenAI"}]}"#);
        let first = interpreter.check(PNG);
        let second = interpreter.check(PNG);
        assert_eq!(first, second);
        assert_eq!(first.matched_keywords, vec!["dall-e", "openai"]);
    }

    #[test]
    fn test_from_config_limits() {
        let mut config = KernelConfig::default();
        config.max_manifest_depth = 7;
        config.max_manifest_nodes = 99;
        let interpreter = ManifestInterpreter::from_config(
            &config,
            Arc::new(ExternalManifestSource::new(|_, _| Ok("{}".into()))),
        );
        assert_eq!(
            interpreter.limits(),
            &ManifestLimits {
                max_depth: 7,
                max_nodes: 99
            }
        );
        assert_eq!(interpreter.allowlist().len(), crate::keywords::AI_KEYWORDS.len());
    }
}
