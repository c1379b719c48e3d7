//! Resolver
//!
//! Answers "what is my public address" for one family: a fresh cache entry
//! short-circuits the network, otherwise the detector races the service
//! catalog and the winner is written back to the cache file.

pub mod errors;
pub mod impls;
pub mod types;
