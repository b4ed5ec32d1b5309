// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Provenance Kernel Request Payload
// ─────────────────────────────────────────────────────────────────────

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{KernelError, KernelResult};

/// Content types the kernel accepts at ingress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentType {
    #[serde(rename = "image/jpeg")]
    Jpeg,
    #[serde(rename = "image/png")]
    Png,
}

impl ContentType {
    /// Parse a declared MIME type. Case-insensitive; parameters are ignored.
    pub fn from_mime(mime: &str) -> KernelResult<Self> {
        let essence = mime
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "image/jpeg" => Ok(ContentType::Jpeg),
            "image/png" => Ok(ContentType::Png),
            _ => Err(KernelError::Validation(format!(
                "only JPEG and PNG images are accepted, got {mime:?}"
            ))),
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            ContentType::Jpeg => "image/jpeg",
            ContentType::Png => "image/png",
        }
    }

    /// File extension used for scratch copies.
    pub fn extension(&self) -> &'static str {
        match self {
            ContentType::Jpeg => "jpg",
            ContentType::Png => "png",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

/// One submitted image: raw bytes plus the declared content type.
///
/// The declared type only steers the scratch file name. Layer A sniffs
/// the container format from the bytes themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBytes {
    bytes: Vec<u8>,
    content_type: ContentType,
}

impl ImageBytes {
    pub fn new(bytes: Vec<u8>, content_type: ContentType) -> KernelResult<Self> {
        if bytes.is_empty() {
            return Err(KernelError::Validation("empty image payload".to_string()));
        }
        Ok(Self {
            bytes,
            content_type,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_jpeg_and_png() {
        assert_eq!(ContentType::from_mime("image/jpeg").unwrap(), ContentType::Jpeg);
        assert_eq!(ContentType::from_mime("image/png").unwrap(), ContentType::Png);
    }

    #[test]
    fn test_mime_case_and_parameters() {
        assert_eq!(ContentType::from_mime("Image/PNG").unwrap(), ContentType::Png);
        assert_eq!(
            ContentType::from_mime("image/jpeg; charset=binary").unwrap(),
            ContentType::Jpeg
        );
    }

    #[test]
    fn test_rejects_other_types() {
        for mime in ["image/gif", "image/webp", "image/jpg", "text/plain", ""] {
            let err = ContentType::from_mime(mime).unwrap_err();
            assert!(err.is_client_error(), "{mime} should be a client error");
        }
    }

    #[test]
    fn test_extension() {
        assert_eq!(ContentType::Jpeg.extension(), "jpg");
        assert_eq!(ContentType::Png.extension(), "png");
    }

    #[test]
    fn test_empty_payload_rejected() {
        let err = ImageBytes::new(Vec::new(), ContentType::Png).unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn test_image_bytes_accessors() {
        let img = ImageBytes::new(vec![0xff, 0xd8, 0x00], ContentType::Jpeg).unwrap();
        assert_eq!(img.len(), 3);
        assert_eq!(img.content_type(), ContentType::Jpeg);
        assert_eq!(img.bytes()[0], 0xff);
    }
}
