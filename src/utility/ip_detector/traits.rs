// 3rd party crates
use async_trait::async_trait;

// Current module imports
use super::errors::FetchError;
use super::types::IpVersion;

/// Source of a single address literal.
///
/// Implementations perform exactly one attempt against `endpoint` and must
/// only return literals that validate as `version`.
#[async_trait]
pub trait IpFetcher: Send + Sync {
    async fn fetch(&self, endpoint: &str, version: IpVersion) -> Result<String, FetchError>;
}
