use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use imgroll_catalog::DEFAULT_RESCAN_INTERVAL;
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// Runtime configuration for [`ImageServer`](crate::ImageServer).
///
/// Durations are written as whole seconds in TOML. Missing keys take their
/// default values.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub image_dir: PathBuf,
    /// Maximum age of a catalog snapshot before the next read rescans.
    #[serde(with = "secs")]
    pub rescan_interval: Duration,
    #[serde(with = "secs")]
    pub request_timeout: Duration,
    /// How long in-flight requests may run once shutdown starts.
    #[serde(with = "secs")]
    pub shutdown_grace: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            image_dir: PathBuf::from("./images"),
            rescan_interval: DEFAULT_RESCAN_INTERVAL,
            request_timeout: Duration::from_secs(3),
            shutdown_grace: Duration::from_secs(10),
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(s: &str) -> ServerResult<Self> {
        toml::from_str(s).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn from_toml_file(path: &Path) -> ServerResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Check that the image directory exists and is a directory.
    pub fn validate(&self) -> ServerResult<()> {
        let meta = std::fs::metadata(&self.image_dir).map_err(|e| {
            ServerError::Config(format!(
                "image directory {} is not accessible: {e}",
                self.image_dir.display()
            ))
        })?;
        if !meta.is_dir() {
            return Err(ServerError::Config(format!(
                "image directory {} is not a directory",
                self.image_dir.display()
            )));
        }
        Ok(())
    }
}

mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
