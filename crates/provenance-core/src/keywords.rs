// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — AI Provenance Keyword Allowlist
// ─────────────────────────────────────────────────────────────────────
//! Controlled vocabulary of generator, brand and technique names that
//! count as an explicit AI-generation claim when they appear anywhere in
//! a signed manifest.
//!
//! Matching is case-insensitive substring containment, not whole-word:
//! "Generated with Stable Diffusion XL" matches `stable diffusion`.

/// Terms shipped with this build. Lowercase, versioned with the deployment.
pub const AI_KEYWORDS: &[&str] = &[
    "dall-e",
    "dalle",
    "gemini",
    "firefly",
    "stable diffusion",
    "midjourney",
    "generative ai",
    "ai generated",
    "synthetic media",
    "trained algorithmic media",
    "diffusion model",
    "text-to-image",
    "chatgpt",
    "openai",
    "nano-banana",
];

/// Read-only allowlist of lowercase AI-provenance terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordAllowlist {
    terms: Vec<String>,
}

impl Default for KeywordAllowlist {
    fn default() -> Self {
        Self::with_terms(AI_KEYWORDS.iter().copied())
    }
}

impl KeywordAllowlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from arbitrary terms. Lowercased, blanks and duplicates dropped,
    /// first occurrence keeps its position.
    pub fn with_terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for term in terms {
            let term = term.as_ref().trim().to_lowercase();
            if !term.is_empty() && !out.contains(&term) {
                out.push(term);
            }
        }
        Self { terms: out }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Terms contained in at least one of `haystack`, in allowlist order.
    ///
    /// `haystack` must already be lowercase.
    pub fn find_matches(&self, haystack: &[String]) -> Vec<String> {
        self.terms
            .iter()
            .filter(|term| haystack.iter().any(|s| s.contains(term.as_str())))
            .cloned()
            .collect()
    }
}
