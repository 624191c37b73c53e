//! Upload storage.
//!
//! Uploaded files are stored in one directory under a UUID-based name that
//! keeps the original extension.

mod filename;
mod storage;

pub use filename::{secure_filename, split_extension};
pub use storage::{FileStorage, StoredFile};
