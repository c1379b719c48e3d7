//! `pubip` finds the public IPv4/IPv6 address of this machine.
//!
//! The [`resolver::types::Resolver`] answers from a small cache file while
//! its entries are fresh, and otherwise races the echo services of the
//! [`utility::ip_detector`] module.

pub mod cli;
pub mod functions;
pub mod resolver;
pub mod settings;
pub mod utility;
