// Standard library
use std::fmt;
use std::sync::{Arc, Mutex};

// 3rd party crates
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

// Project imports
use super::constants::default_parallelism;
use super::traits::IpFetcher;

#[derive(Debug, Deserialize, Clone)]
pub struct IpDetection {
    /// Maximum number of services queried at the same time
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
}

/// Address family requested from, or reported by, a detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IpVersion {
    V4,
    V6,
    /// Whichever family answers first.
    Any,
}

impl fmt::Display for IpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpVersion::V4 => write!(f, "IPv4"),
            IpVersion::V6 => write!(f, "IPv6"),
            IpVersion::Any => write!(f, "IPv6 or IPv4"),
        }
    }
}

/// One echo service. At least one of the two endpoints must be set.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct IpService {
    #[serde(default)]
    pub v4: Option<String>,
    #[serde(default)]
    pub v6: Option<String>,
}

/// Ordered list of services the race draws its tasks from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceCatalog {
    pub services: Vec<IpService>,
}

/// A single `(endpoint, expected family)` pair scheduled in a race.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpTask {
    pub endpoint: String,
    pub version: IpVersion,
}

/// A validated address literal and the family it validated as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedIp {
    pub address: String,
    pub version: IpVersion,
}

/// Races the service catalog for the caller's public address.
pub struct IpDetector {
    pub config: IpDetection,
    pub catalog: ServiceCatalog,
    pub fetcher: Arc<dyn IpFetcher>,
    pub rng: Mutex<StdRng>,
    pub shutdown: CancellationToken,
}

/// Fetches addresses over HTTP with `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    pub client: reqwest::Client,
    pub max_body_bytes: usize,
}
