// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Scratch File Guard
// ─────────────────────────────────────────────────────────────────────
//! Per-request scratch copy of the submitted image.
//!
//! Layer B decodes from disk, so the bytes are written to a uniquely named
//! file first. The guard removes the file when dropped, on success, error
//! and unwind alike. A failed removal is logged and never changes the
//! request outcome.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{Builder, NamedTempFile};

use provenance_types::{ContentType, KernelError, KernelResult};

const PREFIX: &str = "provenance-";

pub struct ScratchFile {
    file: Option<NamedTempFile>,
    path: PathBuf,
}

impl ScratchFile {
    /// Write `bytes` to a fresh file in `dir` (system temp dir when `None`).
    ///
    /// The file name ends in the extension of `content_type`.
    pub fn create(
        dir: Option<&Path>,
        content_type: ContentType,
        bytes: &[u8],
    ) -> KernelResult<Self> {
        let suffix = format!(".{}", content_type.extension());
        let mut builder = Builder::new();
        builder.prefix(PREFIX).suffix(&suffix);

        let mut file = match dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(|e| KernelError::Scratch(format!("cannot create scratch file: {e}")))?;

        file.write_all(bytes)
            .and_then(|_| file.flush())
            .map_err(|e| KernelError::Scratch(format!("cannot write scratch file: {e}")))?;

        let path = file.path().to_path_buf();
        log::debug!("scratch file {} ({} bytes)", path.display(), bytes.len());
        Ok(Self {
            file: Some(file),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            if let Err(e) = file.close() {
                log::warn!("failed to remove scratch file {}: {e}", self.path.display());
            }
        }
    }
}
