//! File storage for uploaded files.
//!
//! Files live in a single flat directory and are addressed by their stored
//! name (`{uuid}{extension}`):
//! ```text
//! {base_path}/
//! ├── 3f2b8c1e-6d4a-4f0e-9a51-2c7d8e9f0a1b.pdf
//! ├── 9a0c7e55-1b2d-4c3e-8f4a-5b6c7d8e9f00.png
//! └── d41d8cd9-8f00-4b20-9e80-0998ecf8427e
//! ```

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use uuid::Uuid;

use super::{secure_filename, split_extension};
use crate::{QrShareError, Result};

/// A file written to storage by [`FileStorage::save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Random token identifying the upload.
    pub file_id: String,
    /// Sanitized original filename.
    pub original_name: String,
    /// Name of the file on disk (token plus original extension).
    pub stored_name: String,
    /// Full path of the file on disk.
    pub path: PathBuf,
    /// Size in bytes.
    pub size: u64,
}

/// Flat-directory file storage.
#[derive(Debug, Clone)]
pub struct FileStorage {
    /// Base directory for file storage.
    base_path: PathBuf,
}

impl FileStorage {
    /// Create a new FileStorage with the given base path.
    ///
    /// The base directory will be created if it doesn't exist.
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path)?;

        Ok(Self { base_path })
    }

    /// Get the base path of this storage.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Save an upload under a freshly generated name.
    ///
    /// `original_name` is sanitized before its extension is taken. The file
    /// is created with `create_new`, so an existing file is never replaced.
    pub fn save(&self, content: &[u8], original_name: &str) -> Result<StoredFile> {
        let original_name = secure_filename(original_name);
        let file_id = Uuid::new_v4().to_string();
        let stored_name = format!("{file_id}{}", split_extension(&original_name));
        let path = self.base_path.join(&stored_name);

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)?;
        if let Err(e) = file.write_all(content).and_then(|()| file.sync_all()) {
            drop(file);
            let _ = fs::remove_file(&path);
            return Err(e.into());
        }

        Ok(StoredFile {
            file_id,
            original_name,
            stored_name,
            path,
            size: content.len() as u64,
        })
    }

    /// Path of an existing stored file.
    ///
    /// Returns `NotFound` when the file does not exist or `stored_name` is
    /// not a plain filename.
    pub fn locate(&self, stored_name: &str) -> Result<PathBuf> {
        self.resolve(stored_name)
            .filter(|path| path.is_file())
            .ok_or_else(|| QrShareError::NotFound(format!("File: {stored_name}")))
    }

    /// Load the content of a stored file.
    ///
    /// Returns `NotFound` when the file does not exist or `stored_name` is
    /// not a plain filename.
    pub fn load(&self, stored_name: &str) -> Result<Vec<u8>> {
        let path = self.locate(stored_name)?;

        match fs::read(&path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(QrShareError::NotFound(format!("File: {stored_name}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Check if a file exists in storage.
    pub fn exists(&self, stored_name: &str) -> bool {
        self.locate(stored_name).is_ok()
    }

    /// Map a stored name to its path inside the storage directory.
    ///
    /// Returns `None` for anything but a single normal path component that
    /// does not start with a dot, so `..`, `a/b` and `.env` never resolve.
    pub fn resolve(&self, stored_name: &str) -> Option<PathBuf> {
        if stored_name.is_empty() || stored_name.starts_with('.') || stored_name.contains('\\') {
            return None;
        }

        let mut components = Path::new(stored_name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Some(self.base_path.join(stored_name)),
            _ => None,
        }
    }
}
