use std::net::IpAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "imgroll",
    about = "Serve a random image from a directory over HTTP",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP server
    Serve(ServeArgs),
    /// Scan a directory once and print its catalog
    List(ListArgs),
}

pub const IMAGE_DIR_ENV: &str = "IMAGE_DIR";
pub const PORT_ENV: &str = "PORT";
pub const DEFAULT_IMAGE_DIR: &str = "./images";

#[derive(Args)]
pub struct ServeArgs {
    /// Directory to serve images from [env: IMAGE_DIR] [default: ./images]
    #[arg(long)]
    pub image_dir: Option<PathBuf>,
    /// Port to listen on [env: PORT] [default: 8080]
    #[arg(short, long)]
    pub port: Option<u16>,
    /// Address to bind [default: 0.0.0.0]
    #[arg(long)]
    pub host: Option<IpAddr>,
    /// TOML file with server settings
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct ListArgs {
    /// Directory to scan [env: IMAGE_DIR] [default: ./images]
    pub dir: Option<PathBuf>,
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,
}

/// Reads a variable from the process environment.
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// `key` from `lookup`, with an empty value treated as unset.
fn non_empty(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).filter(|value| !value.is_empty())
}

impl ServeArgs {
    /// The `--image-dir` flag, else a non-empty `IMAGE_DIR`.
    pub fn image_dir_or_env(&self, lookup: impl Fn(&str) -> Option<String>) -> Option<PathBuf> {
        self.image_dir
            .clone()
            .or_else(|| non_empty(&lookup, IMAGE_DIR_ENV).map(PathBuf::from))
    }

    /// The `--port` flag, else a non-empty `PORT`.
    pub fn port_or_env(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<Option<u16>> {
        if let Some(port) = self.port {
            return Ok(Some(port));
        }
        non_empty(&lookup, PORT_ENV)
            .map(|value| {
                value
                    .parse::<u16>()
                    .with_context(|| format!("invalid {PORT_ENV} value {value:?}"))
            })
            .transpose()
    }
}

impl ListArgs {
    /// The positional directory, else a non-empty `IMAGE_DIR`, else `./images`.
    pub fn dir_or_env(&self, lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
        self.dir
            .clone()
            .or_else(|| non_empty(&lookup, IMAGE_DIR_ENV).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_IMAGE_DIR))
    }
}
