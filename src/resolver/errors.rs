// 3rd party crates
use thiserror::Error;

// Project imports
use crate::utility::ip_detector::errors::IpDetectionError;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Detection(#[from] IpDetectionError),
}
