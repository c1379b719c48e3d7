// Standard library
use std::net::{Ipv4Addr, Ipv6Addr};

// Current module imports
use super::types::IpVersion;

/// Returns `true` if `s` is a dotted-quad IPv4 literal.
pub fn is_ipv4(s: &str) -> bool {
    s.parse::<Ipv4Addr>().is_ok()
}

/// Returns `true` if `s` is an IPv6 literal.
pub fn is_ipv6(s: &str) -> bool {
    s.parse::<Ipv6Addr>().is_ok()
}

/// Checks `s` against the given family. `Any` accepts either.
pub fn matches_version(s: &str, version: IpVersion) -> bool {
    match version {
        IpVersion::V4 => is_ipv4(s),
        IpVersion::V6 => is_ipv6(s),
        IpVersion::Any => is_ipv4(s) || is_ipv6(s),
    }
}

/// The endpoint with surrounding whitespace removed, `None` if nothing is left.
pub fn usable_endpoint(endpoint: &Option<String>) -> Option<&str> {
    endpoint.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
