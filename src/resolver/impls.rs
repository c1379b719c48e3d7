// Standard library
use std::path::PathBuf;

// 3rd party crates
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

// Project imports
use crate::utility::cache::AddressCache;
use crate::utility::ip_detector::types::{DetectedIp, IpDetector, IpVersion};

// Current module imports
use super::errors::ResolveError;
use super::types::{BothAddresses, CacheMode, Resolver};

impl CacheMode {
    pub fn reads(self) -> bool {
        self == CacheMode::ReadWrite
    }

    pub fn writes(self) -> bool {
        self != CacheMode::Disabled
    }
}

impl BothAddresses {
    /// `true` when both families resolved.
    pub fn is_complete(&self) -> bool {
        self.v6.is_ok() && self.v4.is_ok()
    }
}

impl Resolver {
    /// Creates a resolver, reading the cache file once if there is one to use.
    pub async fn new(
        detector: IpDetector,
        cache_file: Option<PathBuf>,
        ttl_seconds: u64,
        mode: CacheMode,
    ) -> Self {
        let cache = match &cache_file {
            Some(path) if mode != CacheMode::Disabled => {
                AddressCache::load(path, ttl_seconds).await
            }
            _ => AddressCache::new(ttl_seconds),
        };
        Self::with_cache(detector, cache, cache_file, mode)
    }

    pub fn with_cache(
        detector: IpDetector,
        cache: AddressCache,
        cache_file: Option<PathBuf>,
        mode: CacheMode,
    ) -> Self {
        Self {
            detector,
            cache: Mutex::new(cache),
            cache_file,
            mode,
        }
    }

    /// Returns the public address for `version`, from the cache when fresh.
    pub async fn resolve(&self, version: IpVersion) -> Result<DetectedIp, ResolveError> {
        if self.mode.reads() {
            match self.cache.lock().await.lookup(version) {
                Ok(detected) => {
                    debug!("{} address found in cache: {}", version, detected.address);
                    return Ok(detected);
                }
                Err(e) => debug!("{}, querying services", e),
            }
        }

        let detected = self.detector.detect_ip(version).await?;

        if self.mode.writes() {
            self.store(&detected).await;
        }

        Ok(detected)
    }

    /// Resolves IPv6 and IPv4 concurrently; one failing never hides the other.
    pub async fn resolve_both(&self) -> BothAddresses {
        let (v6, v4) = tokio::join!(self.resolve(IpVersion::V6), self.resolve(IpVersion::V4));
        BothAddresses { v6, v4 }
    }

    /// Records `detected` and rewrites the cache file. Save errors are only logged.
    async fn store(&self, detected: &DetectedIp) {
        let mut cache = self.cache.lock().await;
        cache.set_address(detected.version, &detected.address);

        let Some(path) = &self.cache_file else {
            return;
        };
        match cache.save(path).await {
            Ok(()) => info!("{} address cached in {:?}", detected.version, path),
            Err(e) => warn!("Failed to write cache file {:?}: {}", path, e),
        }
    }
}
