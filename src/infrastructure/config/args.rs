use super::app_config::{CacheBackend, LogLevel};
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(
    name = "photo-gallery",
    version,
    about = "Load a set of photos through the image cache",
    long_about = None
)]
pub struct CliArgs {
    /// Photo URLs, in gallery order.
    #[arg(value_name = "URL")]
    pub urls: Vec<String>,

    /// Configuration file path.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH")]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Cache implementation behind the shared gateway.
    #[arg(long, value_enum)]
    pub cache_backend: Option<CacheBackend>,

    /// Read and write the cache for every photo.
    #[arg(long)]
    pub cache_photos: Option<bool>,

    /// Directory for the disk cache backend.
    #[arg(long, value_name = "PATH")]
    pub disk_dir: Option<PathBuf>,

    /// Request timeout in seconds.
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Extra request header sent with every photo, as NAME:VALUE.
    #[arg(short = 'H', long = "header", value_name = "NAME:VALUE", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Caption applied to every photo.
    #[arg(long)]
    pub caption: Option<String>,
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected NAME:VALUE, got {raw:?}"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err("header name is empty".to_string());
    }
    Ok((name.to_string(), value.trim().to_string()))
}
