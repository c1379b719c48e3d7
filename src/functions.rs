// Standard library
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

// 3rd party crates
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};
use tracing_subscriber::filter::{Directive, LevelFilter};
use tracing_subscriber::EnvFilter;

// Project imports
use crate::cli::Args;
use crate::resolver::types::{CacheMode, Resolver};
use crate::settings::types::ConfigManager;
use crate::utility::cache::{cache_location, CacheError};
use crate::utility::ip_detector::types::IpDetector;

/// Crates whose own logging is only shown at `error`.
const NOISY_CRATES: [&str; 5] = ["hyper", "hyper_util", "reqwest", "rustls", "h2"];

/// Installs the global `tracing` subscriber, writing to stderr.
///
/// Fails if a global subscriber is already set.
pub fn init_logging(log_level: &str) -> Result<(), Box<dyn Error + Send + Sync + 'static>> {
    let mut filter: EnvFilter = EnvFilter::builder()
        .with_default_directive(LevelFilter::ERROR.into())
        .parse_lossy(log_level);

    for krate in NOISY_CRATES {
        if let Ok(directive) = format!("{}=error", krate).parse::<Directive>() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_level(true)
        .with_writer(std::io::stderr)
        .try_init()
}

/// Where the cache lives for `mode`; `None` when the cache is disabled.
fn cache_file_for<F>(mode: CacheMode, locate: F) -> Result<Option<PathBuf>, CacheError>
where
    F: FnOnce() -> Result<PathBuf, CacheError>,
{
    if mode == CacheMode::Disabled {
        return Ok(None);
    }
    locate().map(Some)
}

/// Loads the configuration, resolves the requested address(es) and prints them.
///
/// Addresses go to stdout; every failure is logged and turns into a
/// non-zero exit code.
pub async fn run(args: Args, shutdown: CancellationToken) -> ExitCode {
    let config = ConfigManager::new();

    let log_level: String = match (&config, args.verbose) {
        (_, true) => "debug".to_string(),
        (Ok(config), false) => config.get_log_level(),
        (Err(_), false) => "error".to_string(),
    };
    if let Err(e) = init_logging(&log_level) {
        eprintln!("Failed to install the logger: {}", e);
    }

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    debug!("Settings loaded from {:?}", config.config_path);

    let settings = config.settings.into_inner();
    let mode = args.cache_mode(settings.cache.enabled);

    // Without a place for an enabled cache there is nothing sensible to do.
    let cache_file = match cache_file_for(mode, cache_location) {
        Ok(path) => path,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut detection = settings.detection.clone();
    if let Some(parallel) = args.parallel {
        detection.parallelism = usize::from(parallel);
    }

    let catalog = settings.get_catalog();
    debug!(
        services = catalog.len(),
        parallelism = detection.parallelism,
        "Detector configured"
    );

    let detector = match IpDetector::with_http(detection, catalog) {
        Ok(detector) => detector.with_cancellation(shutdown),
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let resolver = Resolver::new(detector, cache_file, settings.cache.ttl, mode).await;

    if args.both {
        let both = resolver.resolve_both().await;
        match &both.v6 {
            Ok(detected) => println!("IPv6: {}", detected.address),
            Err(e) => error!("IPv6: {}", e),
        }
        match &both.v4 {
            Ok(detected) => println!("IPv4: {}", detected.address),
            Err(e) => error!("IPv4: {}", e),
        }
        return if both.is_complete() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        };
    }

    match resolver.resolve(args.ip_version()).await {
        Ok(detected) => {
            println!("{}", detected.address);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Could not determine public address: {}", e);
            ExitCode::FAILURE
        }
    }
}
