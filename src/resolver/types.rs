// Standard library
use std::path::PathBuf;

// 3rd party crates
use tokio::sync::Mutex;

// Project imports
use crate::utility::cache::AddressCache;
use crate::utility::ip_detector::types::{DetectedIp, IpDetector};

// Current module imports
use super::errors::ResolveError;

/// How the resolver uses the cache file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheMode {
    /// Answer from the cache when fresh, store new results.
    ReadWrite,
    /// Always query the services, still store new results.
    WriteOnly,
    /// Never touch the cache.
    Disabled,
}

/// Owns the in-memory cache for the lifetime of the process.
pub struct Resolver {
    pub detector: IpDetector,
    pub cache: Mutex<AddressCache>,
    /// `None` when the cache is disabled.
    pub cache_file: Option<PathBuf>,
    pub mode: CacheMode,
}

/// Per-family outcome of resolving both address families.
#[derive(Debug)]
pub struct BothAddresses {
    pub v6: Result<DetectedIp, ResolveError>,
    pub v4: Result<DetectedIp, ResolveError>,
}
