use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::Result;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use photo_gallery::application::services::{MainContext, PhotoEventBus, PhotoLoader};
use photo_gallery::domain::entities::{Photo, PhotoHeaders};
use photo_gallery::infrastructure::image::{HttpImageFetcher, ImageCacheGateway};
use photo_gallery::infrastructure::{AppConfig, CliArgs, ConfigStore};
use photo_gallery::presentation::Gallery;

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    if let Some(log_path) = &config.log_path {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();

        info!(path = %log_path.display(), "Logging initialized");
    } else {
        let stderr_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .init();
    }

    Ok(())
}

fn load_config(args: &CliArgs) -> Result<AppConfig> {
    let store = match &args.config {
        Some(path) => ConfigStore::at(path.clone()),
        None => ConfigStore::platform().unwrap_or_else(|_| {
            ConfigStore::at(
                std::env::temp_dir()
                    .join(photo_gallery::NAME)
                    .join("config.toml"),
            )
        }),
    };
    let mut config = store.load()?;
    config.merge_with_args(args);
    Ok(config)
}

fn create_gallery(args: &CliArgs, config: &AppConfig) -> Result<Gallery> {
    ImageCacheGateway::shared().install(config.cache.build()?);

    let (main, handle) = MainContext::new();
    let events = PhotoEventBus::new(config.events.capacity);
    let fetcher = HttpImageFetcher::new(config.http.fetcher_config());
    let loader = PhotoLoader::new(handle, events).with_fetcher(Arc::new(fetcher));

    let headers: Option<PhotoHeaders> =
        (!args.headers.is_empty()).then(|| args.headers.iter().cloned().collect());

    let mut gallery = Gallery::new(loader, main);
    for url in &args.urls {
        let mut photo = Photo::from_url(url.as_str(), headers.clone())
            .with_caching(config.cache.cache_photos);
        if let Some(caption) = &args.caption {
            photo = photo.with_caption(caption.as_str());
        }
        gallery.push(photo);
    }

    Ok(gallery)
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = CliArgs::parse();
    let config = load_config(&args)?;

    init_logging(&config)?;

    info!(
        version = photo_gallery::VERSION,
        backend = %config.cache.backend,
        photos = args.urls.len(),
        "Starting photo gallery"
    );

    let mut gallery = create_gallery(&args, &config)?;
    for report in gallery.load_all().await {
        println!("{report}");
    }

    Ok(())
}
