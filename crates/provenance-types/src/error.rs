// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Provenance Kernel Error Hierarchy
// ─────────────────────────────────────────────────────────────────────

use thiserror::Error;

/// Root error type for all Provenance Kernel failures.
///
/// Layer A failures (`Provenance`) never leave the interpreter; they are
/// folded into a non-AI verdict. Everything raised by Layer B reaches the
/// caller.
#[derive(Error, Debug)]
pub enum KernelError {
    /// Rejected at ingress (content type, empty payload).
    #[error("validation error: {0}")]
    Validation(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Provenance container missing, corrupt, unverifiable or over limits.
    #[error("provenance error: {0}")]
    Provenance(String),

    /// Classifier weights do not match the expected architecture.
    #[error("classifier load error: {0}")]
    ClassifierLoad(String),

    /// Forward pass failed.
    #[error("inference error: {0}")]
    Inference(String),

    /// Numerical error (NaN/Inf or out-of-range probability, empty input).
    #[error("numerical error: {0}")]
    Numerical(String),

    /// Layer B could not decode the submitted image.
    #[error("image decode error: {0}")]
    ImageDecode(String),

    /// Scratch file could not be created or written.
    #[error("scratch file error: {0}")]
    Scratch(String),

    /// Layer B exceeded its deadline.
    #[error("timeout: forensic analysis exceeded {deadline_ms}ms deadline")]
    Timeout { deadline_ms: u64 },
}

impl KernelError {
    /// True when the caller sent something the kernel refuses to look at.
    ///
    /// Everything else is a server-side failure.
    pub fn is_client_error(&self) -> bool {
        matches!(self, KernelError::Validation(_))
    }
}

pub type KernelResult<T> = Result<T, KernelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_split() {
        assert!(KernelError::Validation("gif".into()).is_client_error());
        assert!(!KernelError::Inference("boom".into()).is_client_error());
        assert!(!KernelError::Timeout { deadline_ms: 10 }.is_client_error());
    }

    #[test]
    fn test_timeout_message() {
        let e = KernelError::Timeout { deadline_ms: 250 };
        assert_eq!(
            e.to_string(),
            "timeout: forensic analysis exceeded 250ms deadline"
        );
    }
}
