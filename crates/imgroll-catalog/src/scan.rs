//! Walking the image root and collecting catalog entries.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::cancel::CancelToken;
use crate::error::{CatalogError, CatalogResult};
use crate::ext::{extension_of, is_supported};

/// A path to a supported image, relative to the catalog root.
///
/// Components are always separated by `/`, whatever the host platform, so
/// an entry can be used verbatim in a URL or JSON listing.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogEntry(String);

impl CatalogEntry {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The entry as a relative filesystem path, ready for `root.join(..)`.
    pub fn to_path(&self) -> PathBuf {
        self.0.split('/').collect()
    }

    /// Builds an entry from `path` below `root`. Returns `None` when `path`
    /// is not under `root` or is not valid UTF-8.
    fn from_walk(root: &Path, path: &Path) -> Option<Self> {
        let rel = path.strip_prefix(root).ok()?;
        let parts = rel
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<Vec<_>>>()?;
        if parts.is_empty() {
            return None;
        }
        Some(Self(parts.join("/")))
    }
}

impl fmt::Display for CatalogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CatalogEntry {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Produces the list of catalog entries below a root directory.
///
/// Implementations must be all-or-nothing: either every matching entry is
/// returned, or an error is, never a partial list.
pub trait Scanner: Send + Sync {
    /// Scan `root`, stopping early with [`CatalogError::Cancelled`] if
    /// `cancel` fires.
    fn scan(&self, root: &Path, cancel: &CancelToken) -> CatalogResult<Vec<CatalogEntry>>;
}

impl<S: Scanner + ?Sized> Scanner for std::sync::Arc<S> {
    fn scan(&self, root: &Path, cancel: &CancelToken) -> CatalogResult<Vec<CatalogEntry>> {
        (**self).scan(root, cancel)
    }
}

/// Recursive filesystem scanner backed by `walkdir`.
///
/// Symlinks are not followed and never count as regular files. Siblings are
/// visited in file-name order, so two scans of an unchanged tree yield the
/// same sequence.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsScanner;

impl Scanner for FsScanner {
    fn scan(&self, root: &Path, cancel: &CancelToken) -> CatalogResult<Vec<CatalogEntry>> {
        let started = Instant::now();
        let mut entries = Vec::new();

        let walker = WalkDir::new(root).follow_links(false).sort_by_file_name();
        for item in walker {
            if cancel.is_cancelled() {
                return Err(CatalogError::Cancelled);
            }
            let item = item.map_err(|source| CatalogError::Scan {
                root: root.to_path_buf(),
                source,
            })?;
            if !item.file_type().is_file() {
                continue;
            }

            let Some(name) = item.file_name().to_str() else {
                tracing::debug!(path = %item.path().display(), "skipping non-UTF-8 file name");
                continue;
            };
            if !extension_of(name).is_some_and(is_supported) {
                continue;
            }

            match CatalogEntry::from_walk(root, item.path()) {
                Some(entry) => entries.push(entry),
                None => {
                    tracing::debug!(path = %item.path().display(), "skipping unrepresentable path");
                }
            }
        }

        tracing::debug!(
            root = %root.display(),
            count = entries.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "catalog scan finished"
        );
        Ok(entries)
    }
}
