//! Access to the authoritative copy of a document.
//!
//! [`TextStorage`](crate::TextStorage) only touches the disk when it reloads, and it goes through
//! [`TextHost`] so tests and embedders can supply their own backend.

use std::io;
use std::path::Path;
use std::time::SystemTime;

/// Source of file contents and metadata.
pub trait TextHost: Send + Sync {
    /// Read the whole file as UTF-8 text.
    fn read_file(&self, path: &Path) -> io::Result<String>;

    /// Last modification time, or `None` if the file is missing.
    fn modified_time(&self, path: &Path) -> Option<SystemTime>;

    /// Size in bytes without reading the file. `None` means "unknown", in which case the
    /// size of the text that was read is used.
    fn file_size(&self, _path: &Path) -> Option<u64> {
        None
    }
}

/// [`TextHost`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsHost;

impl TextHost for FsHost {
    fn read_file(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn modified_time(&self, path: &Path) -> Option<SystemTime> {
        std::fs::metadata(path).and_then(|meta| meta.modified()).ok()
    }

    fn file_size(&self, path: &Path) -> Option<u64> {
        std::fs::metadata(path).map(|meta| meta.len()).ok()
    }
}
