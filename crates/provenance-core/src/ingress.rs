// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Ingress Gate
// ─────────────────────────────────────────────────────────────────────
//! Content-type gate in front of the pipeline. Only JPEG and PNG uploads
//! get through; everything else is a client error and no layer runs.

use provenance_types::{ContentType, ImageBytes, KernelResult};

/// Validate a declared content type and payload.
pub fn accept(content_type: &str, bytes: Vec<u8>) -> KernelResult<ImageBytes> {
    let content_type = ContentType::from_mime(content_type)
        .inspect_err(|e| log::info!("ingress rejected upload: {e}"))?;
    ImageBytes::new(bytes, content_type)
}
