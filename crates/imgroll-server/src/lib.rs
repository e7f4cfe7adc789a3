//! HTTP server for imgroll.
//!
//! Serves a randomly chosen image from the catalog, a JSON listing of the
//! catalog, and the image files themselves. All catalog access goes through
//! [`ImageRepository`](imgroll_catalog::ImageRepository), so the routes can
//! be tested against any implementation.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use handler::{AppState, ImageList};
pub use router::build_router;
pub use server::ImageServer;
