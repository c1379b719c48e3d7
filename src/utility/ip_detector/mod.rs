//! IP Detection Module
//!
//! This module discovers the public IPv4/IPv6 address of the host by racing
//! a catalog of "what is my IP" echo services.
//!
//! # Features
//!
//! - Swappable service catalog with IPv4-only, IPv6-only and dual-stack entries
//! - Randomized task order so load spreads across services run to run
//! - Bounded concurrency, first validated answer wins
//! - Strict per-response validation (status, body size, address family)
//!
//! # Architecture
//!
//! - `functions`: pure address-literal validators
//! - `traits`: the `IpFetcher` seam, one attempt against one endpoint
//! - `impls`: `HttpFetcher`, catalog filtering and the race in `IpDetector`
//!
//! # Example
//!
//! ```rust,ignore
//! let detector = IpDetector::with_http(IpDetection::default(), ServiceCatalog::default())?;
//! let detected = detector.detect_ip(IpVersion::Any).await?;
//! println!("{} ({})", detected.address, detected.version);
//! ```
//!
//! # Error Handling
//!
//! Failures of individual services are logged and swallowed; the caller only
//! sees `IpDetectionError::NoAddressFound` when every candidate failed.

pub mod constants;
pub mod errors;
pub mod functions;
pub mod impls;
pub mod traits;
pub mod types;
