/// Default number of services queried concurrently
pub const DEFAULT_PARALLELISM: usize = 2;

/// HTTP client settings
pub const REQUEST_TIMEOUT_SECS: u64 = 2;
pub const MAX_BODY_BYTES: usize = 64;
pub const CONTENT_TYPE_TEXT_PLAIN: &str = "text/plain";

/// Default echo services as `(IPv4 endpoint, IPv6 endpoint)` pairs.
pub const DEFAULT_SERVICES: [(Option<&str>, Option<&str>); 16] = [
    (None, Some("http://ident.me")),
    (Some("http://ipecho.net/plain"), None),
    (Some("https://v4.ifconfig.co"), None),
    (Some("https://ipinfo.io/ip"), None),
    // Dual-stack services
    (
        Some("https://ipv4.icanhazip.com"),
        Some("https://ipv6.icanhazip.com"),
    ),
    (None, Some("http://bot.whatismyipaddress.com")),
    (
        Some("https://ipv4.myexternalip.com/raw"),
        Some("https://myexternalip.com/raw"),
    ),
    (Some("http://checkip.amazonaws.com"), None),
    (Some("https://4.ifcfg.me"), Some("https://6.ifcfg.me")),
    (None, Some("https://ip.tyk.nu")),
    (None, Some("https://tnx.nl/ip")),
    (Some("https://www.l2.io/ip"), Some("https://l2.io/ip")),
    (None, Some("https://ip.appspot.com")),
    (None, Some("https://wgetip.com")),
    (Some("http://eth0.me"), None),
    (Some("https://api.ipify.org"), Some("https://api6.ipify.org")),
];

pub fn default_parallelism() -> usize {
    DEFAULT_PARALLELISM
}
