// 3rd party crates
use thiserror::Error;

// Current module imports
use super::types::IpVersion;

/// Why a single service did not produce an address.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error from {endpoint}: {error}")]
    Transport {
        endpoint: String,
        error: reqwest::Error,
    },

    #[error("Status code {status} from {endpoint}")]
    BadStatus { endpoint: String, status: u16 },

    #[error("Invalid response from {endpoint}: {reason}")]
    InvalidBody { endpoint: String, reason: String },

    #[error("IP version mismatch from {endpoint}: expected {expected}, got {body:?}")]
    FamilyMismatch {
        endpoint: String,
        expected: IpVersion,
        body: String,
    },
}

#[derive(Debug, Error)]
pub enum IpDetectionError {
    #[error("No {version} address found, {attempted} services tried")]
    NoAddressFound { version: IpVersion, attempted: usize },

    #[error("{0} detection was cancelled")]
    Cancelled(IpVersion),

    #[error("HTTP client error: {0}")]
    HttpClientBuild(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum IpDetectionValidationError {
    #[error("Invalid parallelism: {0}")]
    InvalidParallelism(String),
    #[error("Service #{0} has neither a v4 nor a v6 endpoint")]
    EmptyService(usize),
}
