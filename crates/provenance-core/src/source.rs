// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Provenance Manifest Sources
// ─────────────────────────────────────────────────────────────────────
//! Readers that open the signed provenance container embedded in an
//! image and hand its manifest store back as JSON text.
//!
//! In production the C2PA reader runs behind this trait. The external
//! source lets a host (the Python bridge, a test) supply its own reader.

use std::sync::Arc;

use provenance_types::{KernelError, KernelResult};

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";
const JPEG_SIGNATURE: &[u8] = b"\xff\xd8";

/// Image container, identified from the byte signature alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerFormat {
    Png,
    Jpeg,
}

impl ContainerFormat {
    /// Classify `bytes` by magic number. `None` for anything else.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(PNG_SIGNATURE) {
            Some(ContainerFormat::Png)
        } else if bytes.starts_with(JPEG_SIGNATURE) {
            Some(ContainerFormat::Jpeg)
        } else {
            None
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            ContainerFormat::Png => "image/png",
            ContainerFormat::Jpeg => "image/jpeg",
        }
    }
}

/// Trait for provenance container readers.
///
/// Returns the manifest store as JSON. Any failure to locate, parse or
/// verify the container is an `Err`; the interpreter decides what that
/// means for the verdict.
pub trait ManifestSource: Send + Sync {
    fn name(&self) -> &str;

    fn read_manifest(&self, format: ContainerFormat, bytes: &[u8]) -> KernelResult<String>;
}

/// Source for builds without a C2PA reader: nothing is ever found.
pub struct NoManifestSource;

impl ManifestSource for NoManifestSource {
    fn name(&self) -> &str {
        "none"
    }

    fn read_manifest(&self, _format: ContainerFormat, _bytes: &[u8]) -> KernelResult<String> {
        Err(KernelError::Provenance(
            "no provenance container reader available".to_string(),
        ))
    }
}

/// External manifest source that calls a function pointer.
///
/// Used by the PyO3 FFI layer to delegate reading to a Python-side C2PA
/// binding, and by tests to script manifests.
type ReadManifestFn = Box<dyn Fn(ContainerFormat, &[u8]) -> KernelResult<String> + Send + Sync>;

pub struct ExternalManifestSource {
    read_fn: ReadManifestFn,
}

impl ExternalManifestSource {
    pub fn new(
        read_fn: impl Fn(ContainerFormat, &[u8]) -> KernelResult<String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            read_fn: Box::new(read_fn),
        }
    }
}

impl ManifestSource for ExternalManifestSource {
    fn name(&self) -> &str {
        "external"
    }

    fn read_manifest(&self, format: ContainerFormat, bytes: &[u8]) -> KernelResult<String> {
        (self.read_fn)(format, bytes)
    }
}

/// C2PA manifest store reader backed by the `c2pa` crate.
///
/// Reads from an in-memory stream. The reader records signature and hash
/// failures instead of returning them, so an `Invalid` store is turned into
/// an error here. A valid store from an untrusted signer is accepted, since
/// no trust list is configured.
#[cfg(feature = "c2pa")]
pub struct C2paManifestSource;

#[cfg(feature = "c2pa")]
impl ManifestSource for C2paManifestSource {
    fn name(&self) -> &str {
        "c2pa"
    }

    fn read_manifest(&self, format: ContainerFormat, bytes: &[u8]) -> KernelResult<String> {
        let stream = std::io::Cursor::new(bytes);
        let reader = c2pa::Reader::from_stream(format.mime(), stream)
            .map_err(|e| KernelError::Provenance(e.to_string()))?;

        if reader.validation_state() == c2pa::ValidationState::Invalid {
            let codes: Vec<&str> = reader
                .validation_status()
                .unwrap_or_default()
                .iter()
                .map(|status| status.code())
                .collect();
            return Err(KernelError::Provenance(format!(
                "manifest store failed validation: {}",
                codes.join(", ")
            )));
        }

        Ok(reader.json())
    }
}

/// Best source compiled into this build.
pub fn default_source() -> Arc<dyn ManifestSource> {
    #[cfg(feature = "c2pa")]
    {
        Arc::new(C2paManifestSource)
    }
    #[cfg(not(feature = "c2pa"))]
    {
        log::warn!("built without the c2pa feature; Layer A will never find provenance");
        Arc::new(NoManifestSource)
    }
}
