//! The TTL-cached image repository.
//!
//! [`CatalogRepository`] keeps one immutable [`Snapshot`] behind a
//! `RwLock`. Readers check freshness under the shared lock and leave
//! immediately when the snapshot is fresh. A stale snapshot sends callers to
//! the exclusive lock, where staleness is checked again: the first holder
//! rescans and installs a new snapshot, and every holder after it finds the
//! snapshot fresh and skips the scan.

use std::path::PathBuf;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use rand::rngs::{OsRng, StdRng};
use rand::{Rng, SeedableRng};

use crate::cancel::CancelToken;
use crate::error::{CatalogError, CatalogResult};
use crate::scan::{CatalogEntry, FsScanner, Scanner};

/// How long a snapshot is served before the next read triggers a rescan.
pub const DEFAULT_RESCAN_INTERVAL: Duration = Duration::from_secs(12 * 60 * 60);

/// Read access to a catalog of images.
///
/// The HTTP layer depends on this trait rather than on a concrete cache, so
/// handlers can be exercised against test doubles.
pub trait ImageRepository: Send + Sync {
    /// Every entry of the current catalog, in snapshot order.
    fn get_all(&self, cancel: &CancelToken) -> CatalogResult<Vec<CatalogEntry>>;

    /// One entry of the current catalog, chosen uniformly at random.
    ///
    /// Fails with [`CatalogError::NoImages`] when the catalog is empty.
    fn get_random(&self, cancel: &CancelToken) -> CatalogResult<CatalogEntry>;
}

/// An immutable, timestamped materialization of the catalog.
///
/// Cloning is cheap: the entries are shared.
#[derive(Clone, Debug)]
pub struct Snapshot {
    entries: Arc<[CatalogEntry]>,
    taken_at: Option<Instant>,
}

impl Snapshot {
    /// The never-scanned snapshot: no entries and no timestamp.
    pub fn empty() -> Self {
        Self {
            entries: Arc::from(Vec::new()),
            taken_at: None,
        }
    }

    fn taken_now(entries: Vec<CatalogEntry>) -> Self {
        Self {
            entries: Arc::from(entries),
            taken_at: Some(Instant::now()),
        }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// When the scan that produced this snapshot finished, or `None` if the
    /// catalog has never been scanned.
    pub fn taken_at(&self) -> Option<Instant> {
        self.taken_at
    }

    /// Time elapsed since the snapshot was taken.
    pub fn age(&self) -> Option<Duration> {
        self.taken_at.map(|t| t.elapsed())
    }

    /// A snapshot is stale if it was never taken or is older than `ttl`.
    pub fn is_stale(&self, ttl: Duration) -> bool {
        match self.taken_at {
            None => true,
            Some(taken_at) => taken_at.elapsed() > ttl,
        }
    }

    /// Pick one entry uniformly at random.
    fn pick(&self) -> CatalogResult<CatalogEntry> {
        if self.entries.is_empty() {
            return Err(CatalogError::NoImages);
        }
        let mut rng = StdRng::from_rng(OsRng)?;
        let idx = rng.gen_range(0..self.entries.len());
        Ok(self.entries[idx].clone())
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::empty()
    }
}

/// Image catalog for one root directory, rescanned lazily once its snapshot
/// is older than the TTL.
///
/// Construct one per root and share it (typically behind an `Arc`); there is
/// no process-wide instance.
#[derive(Debug)]
pub struct CatalogRepository<S = FsScanner> {
    root: PathBuf,
    ttl: Duration,
    scanner: S,
    snapshot: RwLock<Snapshot>,
}

impl CatalogRepository<FsScanner> {
    /// Create a repository over `root` that walks the filesystem.
    pub fn new(root: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self::with_scanner(root, ttl, FsScanner)
    }
}

impl<S: Scanner> CatalogRepository<S> {
    /// Create a repository that produces snapshots with `scanner`.
    pub fn with_scanner(root: impl Into<PathBuf>, ttl: Duration, scanner: S) -> Self {
        Self {
            root: root.into(),
            ttl,
            scanner,
            snapshot: RwLock::new(Snapshot::empty()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The currently published snapshot, without refreshing it.
    pub fn snapshot(&self) -> CatalogResult<Snapshot> {
        Ok(self.read_lock()?.clone())
    }

    /// Return a fresh snapshot, rescanning first if the current one is stale.
    fn fresh_snapshot(&self, cancel: &CancelToken) -> CatalogResult<Snapshot> {
        {
            let current = self.read_lock()?;
            if !current.is_stale(self.ttl) {
                return Ok(current.clone());
            }
        }

        let mut current = self.write_lock()?;
        // Another writer may have rescanned while we waited for the lock.
        if current.is_stale(self.ttl) {
            match self.scanner.scan(&self.root, cancel) {
                Ok(entries) => {
                    *current = Snapshot::taken_now(entries);
                    tracing::info!(
                        root = %self.root.display(),
                        count = current.len(),
                        "published catalog snapshot"
                    );
                }
                Err(err) => {
                    tracing::warn!(
                        root = %self.root.display(),
                        error = %err,
                        previous_age_secs = current.age().map(|age| age.as_secs()),
                        "rescan failed, keeping previous snapshot"
                    );
                    return Err(err);
                }
            }
        }
        Ok(current.clone())
    }

    fn read_lock(&self) -> CatalogResult<RwLockReadGuard<'_, Snapshot>> {
        self.snapshot
            .read()
            .map_err(|e| CatalogError::LockPoisoned(e.to_string()))
    }

    fn write_lock(&self) -> CatalogResult<RwLockWriteGuard<'_, Snapshot>> {
        self.snapshot
            .write()
            .map_err(|e| CatalogError::LockPoisoned(e.to_string()))
    }
}

impl<S: Scanner> ImageRepository for CatalogRepository<S> {
    fn get_all(&self, cancel: &CancelToken) -> CatalogResult<Vec<CatalogEntry>> {
        Ok(self.fresh_snapshot(cancel)?.entries().to_vec())
    }

    fn get_random(&self, cancel: &CancelToken) -> CatalogResult<CatalogEntry> {
        self.fresh_snapshot(cancel)?.pick()
    }
}
