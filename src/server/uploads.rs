use crate::builder::sha256_hex;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// Directory that keeps a copy of every uploaded specification.
///
/// Files are named by the SHA-256 of their content, so re-uploading the same document
/// rewrites the same file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `bytes` to `<dir>/<sha256>.<json|yaml>` and return the path.
    pub fn persist(&self, bytes: &[u8]) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create upload dir {}", self.dir.display()))?;
        let ext = if bytes.trim_ascii_start().starts_with(b"{") {
            "json"
        } else {
            "yaml"
        };
        let path = self.dir.join(format!("{}.{ext}", sha256_hex(bytes)));
        std::fs::write(&path, bytes)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), size_bytes = bytes.len(), "Stored uploaded specification");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persist_names_by_digest() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path().join("specs"));
        let a = store.persist(b"openapi: 3.1.0\n").unwrap();
        let b = store.persist(b"openapi: 3.1.0\n").unwrap();
        let c = store.persist(b"  {\"openapi\":\"3.1.0\"}").unwrap();

        assert_eq!(a, b);
        assert_eq!(a.extension().unwrap(), "yaml");
        assert_eq!(c.extension().unwrap(), "json");
        assert_eq!(std::fs::read(&a).unwrap(), b"openapi: 3.1.0\n");
        assert_eq!(a.file_stem().unwrap().len(), 64);
    }
}
