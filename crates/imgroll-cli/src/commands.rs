use anyhow::Context;
use colored::Colorize;
use imgroll_catalog::{CancelToken, FsScanner, Scanner};
use imgroll_server::{ImageList, ImageServer, ServerConfig};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => cmd_serve(args),
        Command::List(args) => cmd_list(args),
    }
}

fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = server_config(&args, process_env)?;
    config
        .validate()
        .with_context(|| format!("cannot serve {}", config.image_dir.display()))?;

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    runtime.block_on(ImageServer::new(config).serve(shutdown_signal()))?;
    Ok(())
}

/// Flags and non-empty env vars win over the config file, which wins over
/// defaults.
fn server_config(
    args: &ServeArgs,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<ServerConfig> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::from_toml_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ServerConfig::default(),
    };
    if let Some(dir) = args.image_dir_or_env(&env) {
        config.image_dir = dir;
    }
    if let Some(port) = args.port_or_env(&env)? {
        config.bind_addr.set_port(port);
    }
    if let Some(host) = args.host {
        config.bind_addr.set_ip(host);
    }
    Ok(config)
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

fn cmd_list(args: ListArgs) -> anyhow::Result<()> {
    let dir = args.dir_or_env(process_env);
    let images = FsScanner
        .scan(&dir, &CancelToken::new())
        .with_context(|| format!("failed to scan {}", dir.display()))?;

    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&ImageList::from(images))?);
        }
        OutputFormat::Text => {
            for image in &images {
                println!("  {}", image.as_str().cyan());
            }
            println!(
                "{} {} images in {}",
                "✓".green().bold(),
                images.len().to_string().bold(),
                dir.display()
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use std::path::PathBuf;
    use std::time::Duration;

    fn serve_args() -> ServeArgs {
        ServeArgs {
            image_dir: None,
            port: None,
            host: None,
            config: None,
        }
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn defaults_without_flags() {
        let config = server_config(&serve_args(), no_env).unwrap();
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn flags_override_defaults() {
        let args = ServeArgs {
            image_dir: Some("/srv/pics".into()),
            port: Some(9090),
            host: Some("127.0.0.1".parse().unwrap()),
            ..serve_args()
        };
        let config = server_config(&args, no_env).unwrap();
        assert_eq!(config.image_dir, PathBuf::from("/srv/pics"));
        assert_eq!(
            config.bind_addr,
            "127.0.0.1:9090".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("imgroll.toml");
        std::fs::write(
            &path,
            "bind_addr = \"127.0.0.1:7000\"\nimage_dir = \"/from/file\"\nrescan_interval = 60\n",
        )
        .unwrap();

        let args = ServeArgs {
            port: Some(7001),
            config: Some(path),
            ..serve_args()
        };
        let config = server_config(&args, no_env).unwrap();

        assert_eq!(
            config.bind_addr,
            "127.0.0.1:7001".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(config.image_dir, PathBuf::from("/from/file"));
        assert_eq!(config.rescan_interval, Duration::from_secs(60));
    }

    #[test]
    fn empty_env_falls_back_to_defaults() {
        let env = |key: &str| match key {
            "IMAGE_DIR" | "PORT" => Some(String::new()),
            _ => None,
        };
        let config = server_config(&serve_args(), env).unwrap();
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn env_overrides_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("imgroll.toml");
        std::fs::write(&path, "bind_addr = \"127.0.0.1:7000\"\n").unwrap();

        let env = |key: &str| match key {
            "IMAGE_DIR" => Some("/from/env".to_string()),
            "PORT" => Some("7002".to_string()),
            _ => None,
        };
        let args = ServeArgs {
            config: Some(path),
            ..serve_args()
        };
        let config = server_config(&args, env).unwrap();
        assert_eq!(
            config.bind_addr,
            "127.0.0.1:7002".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(config.image_dir, PathBuf::from("/from/env"));
    }

    #[test]
    fn missing_config_file_is_error() {
        let args = ServeArgs {
            config: Some("/definitely/not/here.toml".into()),
            ..serve_args()
        };
        assert!(server_config(&args, no_env).is_err());
    }
}
