//! Error types for catalog operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while scanning or reading the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Walking the image root failed. Nothing from the walk is published.
    #[error("failed to scan {root}: {source}")]
    Scan {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// The scan was cancelled before it finished.
    #[error("scan cancelled")]
    Cancelled,

    /// The catalog is empty, so there is nothing to pick from.
    #[error("no images found")]
    NoImages,

    /// The random source could not be initialised.
    #[error("random source failed: {0}")]
    RandomSource(#[from] rand::Error),

    /// A thread panicked while holding the snapshot lock.
    #[error("snapshot lock poisoned: {0}")]
    LockPoisoned(String),
}

impl CatalogError {
    /// Returns `true` for errors that mean "nothing there" rather than
    /// "something broke".
    pub fn is_not_found_class(&self) -> bool {
        matches!(self, Self::NoImages)
    }
}

/// Convenience type alias for catalog operations.
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_no_images_is_not_found_class() {
        assert!(CatalogError::NoImages.is_not_found_class());
        assert!(!CatalogError::Cancelled.is_not_found_class());
        assert!(!CatalogError::LockPoisoned("x".into()).is_not_found_class());
    }

    #[test]
    fn display_messages() {
        assert_eq!(CatalogError::NoImages.to_string(), "no images found");
        assert_eq!(CatalogError::Cancelled.to_string(), "scan cancelled");
    }
}
