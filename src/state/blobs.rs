//! Blob storage for original uploads and variant previews
//!
//! Blobs are files under one directory, keyed by a random UUID. Callers only
//! ever see the `blob:<key>` storage reference, which this store alone
//! resolves back to a path.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbaImage};
use tracing::debug;
use uuid::Uuid;

use crate::error::StoreError;

const REF_PREFIX: &str = "blob:";

#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    /// Open (and create if needed) a store rooted at `root`
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Default location in the user's data directory
    pub fn default_dir() -> PathBuf {
        let mut path = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(std::env::temp_dir);
        path.push("roof-recolor");
        path.push("blobs");
        path
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store `bytes` and return their storage reference
    pub fn put(&self, bytes: &[u8], extension: &str) -> Result<String, StoreError> {
        let key = format!("{}.{}", Uuid::new_v4(), extension);
        std::fs::write(self.root.join(&key), bytes)?;
        debug!(key = %key, bytes = bytes.len(), "blob stored");
        Ok(format!("{REF_PREFIX}{key}"))
    }

    /// Encode a rendered variant as PNG and store it
    pub fn put_preview(&self, image: &RgbaImage) -> Result<String, StoreError> {
        let mut buf = Vec::new();
        image.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
        self.put(&buf, "png")
    }

    /// Resolve a storage reference to its file path
    pub fn locate(&self, storage_ref: &str) -> Result<PathBuf, StoreError> {
        let key = storage_ref
            .strip_prefix(REF_PREFIX)
            .filter(|k| !k.is_empty() && !k.contains(['/', '\\']) && !k.starts_with('.'))
            .ok_or_else(|| StoreError::UnknownReference(storage_ref.to_string()))?;

        let path = self.root.join(key);
        if !path.is_file() {
            return Err(StoreError::UnknownReference(storage_ref.to_string()));
        }
        Ok(path)
    }

    pub fn read(&self, storage_ref: &str) -> Result<Vec<u8>, StoreError> {
        Ok(std::fs::read(self.locate(storage_ref)?)?)
    }

    /// Delete a stored blob
    pub fn remove(&self, storage_ref: &str) -> Result<(), StoreError> {
        std::fs::remove_file(self.locate(storage_ref)?)?;
        debug!(storage_ref = %storage_ref, "blob removed");
        Ok(())
    }
}
