//! Image catalog for imgroll.
//!
//! Enumerates the image files below a root directory and keeps the result in
//! an in-memory snapshot that is refreshed lazily once it outlives its TTL.
//!
//! # Architecture
//!
//! - The **extension filter** decides which file names count as images. The
//!   supported set is fixed and compared case-insensitively.
//! - The **scanner** walks the root once and produces the ordered list of
//!   matching paths, relative to the root. A failed walk publishes nothing.
//! - The **repository** owns the current [`Snapshot`], rescans when it goes
//!   stale, and serves concurrent readers. Readers take a shared lock on the
//!   fast path; only a stale snapshot sends callers to the exclusive lock,
//!   where the first entrant rescans and everyone after it reuses the result.
//!
//! # Modules
//!
//! - [`error`] — [`CatalogError`] and the [`CatalogResult`] alias
//! - [`ext`] — [`ImageExt`] and [`is_supported`]
//! - [`cancel`] — [`CancelToken`] threaded through every scan
//! - [`scan`] — [`CatalogEntry`], the [`Scanner`] trait, and [`FsScanner`]
//! - [`repo`] — [`ImageRepository`] and the TTL-cached [`CatalogRepository`]

pub mod cancel;
pub mod error;
pub mod ext;
pub mod repo;
pub mod scan;

pub use cancel::CancelToken;
pub use error::{CatalogError, CatalogResult};
pub use ext::{extension_of, is_supported, ImageExt};
pub use repo::{CatalogRepository, ImageRepository, Snapshot, DEFAULT_RESCAN_INTERVAL};
pub use scan::{CatalogEntry, FsScanner, Scanner};
