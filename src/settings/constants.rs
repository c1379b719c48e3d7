/// Environment variable overriding the configuration file location
pub const CONFIG_PATH_ENV: &str = "PUBIP_CONFIG_PATH";

/// Prefix of `PUBIP__SECTION__KEY` environment overrides
pub const ENV_PREFIX: &str = "PUBIP";
pub const ENV_SEPARATOR: &str = "__";

/// Built-in configuration, layered below the user's file
pub const DEFAULT_CONFIG: &str = r#"
# Logging configuration
[log]
# Level can be "error", "warn", "info", "debug", or "trace"
level = "warn"

# Address detection
[detection]
# How many echo services are queried at the same time
parallelism = 2

# Last known addresses are reused for `ttl` seconds
[cache]
enabled = true
ttl = 900

# Replace the built-in service list (optional). Every entry needs at least
# one of `v4` and `v6`.
#
# [[services]]
# v4 = "https://ipv4.icanhazip.com"
# v6 = "https://ipv6.icanhazip.com"
#
# [[services]]
# v4 = "https://checkip.amazonaws.com"
"#;
