//! Property tests for the Layer A interpreter, the sampler and the
//! aggregator.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use image::{Rgb, RgbImage};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};

use provenance_core::keywords::AI_KEYWORDS;
use provenance_core::{
    aggregate, sample_patches, ExternalManifestSource, KeywordAllowlist, ManifestInterpreter,
    ManifestLimits,
};
use provenance_types::Aggregation;

const PNG_HEADER: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR";

fn interpreter_for(manifest: String) -> ManifestInterpreter {
    ManifestInterpreter::new(
        Arc::new(ExternalManifestSource::new(move |_, _| Ok(manifest.clone()))),
        KeywordAllowlist::default(),
        ManifestLimits::default(),
    )
}

/// Text that cannot contain any allowlist term: digits, spaces and a few
/// letters absent from every term's rarest characters.
fn clean_text() -> impl Strategy<Value = String> {
    "[0-9 .:/_qwxzQWXZ]{0,24}"
}

fn manifest_value(leaf: BoxedStrategy<String>) -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        leaf.prop_map(Value::String),
        any::<i32>().prop_map(|n| json!(n)),
        any::<bool>().prop_map(Value::Bool),
        Just(Value::Null),
    ];
    leaf.prop_recursive(6, 64, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::vec(("[a-z_.]{1,12}", inner), 0..6)
                .prop_map(|entries| Value::Object(entries.into_iter().collect())),
        ]
    })
}

proptest! {
    #[test]
    fn prop_unrecognised_signature_never_consults_source(
        bytes in prop::collection::vec(any::<u8>(), 0..64)
    ) {
        prop_assume!(!bytes.starts_with(b"\x89PNG\r\n\x1a\n"));
        prop_assume!(!bytes.starts_with(&[0xff, 0xd8]));

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let interpreter = ManifestInterpreter::new(
            Arc::new(ExternalManifestSource::new(move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(r#"{"a": "midjourney"}"#.to_string())
            })),
            KeywordAllowlist::default(),
            ManifestLimits::default(),
        );
        let verdict = interpreter.check(&bytes);
        prop_assert!(!verdict.is_ai);
        prop_assert_eq!(verdict.confidence, 0.0);
        prop_assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn prop_manifest_without_terms_is_not_ai(
        value in manifest_value(clean_text().boxed())
    ) {
        let verdict = interpreter_for(value.to_string()).check(PNG_HEADER);
        prop_assert!(!verdict.is_ai);
        prop_assert_eq!(verdict.confidence, 0.0);
        prop_assert!(verdict.matched_keywords.is_empty());
    }

    #[test]
    fn prop_planted_term_is_found(
        value in manifest_value(clean_text().boxed()),
        term_index in 0..AI_KEYWORDS.len(),
        prefix in clean_text(),
        upper in any::<bool>(),
    ) {
        let term = AI_KEYWORDS[term_index];
        let planted = if upper { term.to_uppercase() } else { term.to_string() };
        let manifest = json!({"wrapper": [value, {"claim_generator": format!("{prefix}{planted}")}]});

        let verdict = interpreter_for(manifest.to_string()).check(PNG_HEADER);
        prop_assert!(verdict.is_ai);
        prop_assert_eq!(verdict.confidence, 1.0);
        prop_assert!(verdict.matched_keywords.iter().any(|k| k == term));
        for kw in &verdict.matched_keywords {
            prop_assert!(AI_KEYWORDS.contains(&kw.as_str()));
            prop_assert!(manifest.to_string().to_lowercase().contains(kw.as_str()));
        }
    }

    #[test]
    fn prop_layer_a_is_idempotent(value in manifest_value(".{0,16}".boxed())) {
        let interpreter = interpreter_for(value.to_string());
        prop_assert_eq!(interpreter.check(PNG_HEADER), interpreter.check(PNG_HEADER));
    }

    #[test]
    fn prop_over_deep_manifest_fails_safe(depth in 9usize..40) {
        let mut value = json!("generated by midjourney");
        for _ in 0..depth {
            value = json!([value]);
        }
        let interpreter = ManifestInterpreter::new(
            Arc::new(ExternalManifestSource::new(move |_, _| Ok(value.to_string()))),
            KeywordAllowlist::default(),
            ManifestLimits { max_depth: 8, max_nodes: 1_000 },
        );
        let verdict = interpreter.check(&[0xff, 0xd8, 0xff, 0xe1]);
        prop_assert!(!verdict.is_ai);
        prop_assert!(verdict.reason.starts_with("metadata analysis failed"));
    }

    #[test]
    fn prop_aggregate_stays_within_scores(
        scores in prop::collection::vec(0.0f64..=1.0, 1..32),
        p in 0.0f64..=100.0,
    ) {
        let lo = scores.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        for policy in [Aggregation::Mean, Aggregation::Percentile(p)] {
            let v = aggregate(&scores, policy).unwrap();
            prop_assert!(v >= lo - 1e-12 && v <= hi + 1e-12);
        }
    }

    #[test]
    fn prop_seeded_sampling_reproduces_offsets(
        seed in any::<u64>(),
        w in 16u32..200,
        h in 16u32..200,
        size in 1u32..16,
        n in 1usize..8,
    ) {
        let img = RgbImage::from_fn(w, h, |x, y| Rgb([x as u8, y as u8, 0]));
        let mut rng = StdRng::seed_from_u64(seed);
        let patches: Vec<RgbImage> = sample_patches(&img, size, n, &mut rng).collect();
        prop_assert_eq!(patches.len(), n);

        let mut replay = StdRng::seed_from_u64(seed);
        for patch in &patches {
            let x = replay.gen_range(0..=w - size);
            let y = replay.gen_range(0..=h - size);
            prop_assert_eq!(patch.dimensions(), (size, size));
            prop_assert_eq!(patch.get_pixel(0, 0), &Rgb([x as u8, y as u8, 0]));
        }
    }

    #[test]
    fn prop_fallback_patches_are_identical(
        w in 1u32..24,
        h in 1u32..24,
        n in 1usize..6,
        seed in any::<u64>(),
    ) {
        let img = RgbImage::from_fn(w, h, |x, y| Rgb([(x * 10) as u8, (y * 10) as u8, 1]));
        let mut rng = StdRng::seed_from_u64(seed);
        let patches: Vec<RgbImage> = sample_patches(&img, 24, n, &mut rng).collect();
        prop_assert_eq!(patches.len(), n);
        prop_assert!(patches.iter().all(|p| p == &patches[0]));
        prop_assert_eq!(patches[0].dimensions(), (24, 24));
    }
}

#[test]
fn test_reference_aggregation_values() {
    let scores = [0.1, 0.2, 0.9];
    assert!((aggregate(&scores, Aggregation::Mean).unwrap() - 0.4).abs() < 1e-12);
    assert!((aggregate(&scores, Aggregation::Percentile(50.0)).unwrap() - 0.2).abs() < 1e-12);
}
