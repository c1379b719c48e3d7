// 3rd party crates
use clap::{ArgGroup, Parser};

// Project imports
use crate::resolver::types::CacheMode;
use crate::utility::ip_detector::types::IpVersion;

/// Print your public IP address.
///
/// Several "what is my IP" services are queried at once and the first valid
/// answer is printed. Answers are cached for a few minutes.
#[derive(Debug, Parser)]
#[command(name = "pubip", version, about)]
#[command(group(ArgGroup::new("family").args(["ipv4", "ipv6", "both"])))]
pub struct Args {
    /// Only IPv4
    #[arg(short = '4', long)]
    pub ipv4: bool,

    /// Only IPv6
    #[arg(short = '6', long)]
    pub ipv6: bool,

    /// IPv6 and IPv4
    #[arg(long)]
    pub both: bool,

    /// Print verbose info about app execution
    #[arg(short, long)]
    pub verbose: bool,

    /// Query the services even if a cached address is still fresh
    #[arg(long)]
    pub no_cache: bool,

    /// Number of services queried at the same time
    #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..))]
    pub parallel: Option<u16>,
}

impl Args {
    /// Requested family for single-address mode.
    pub fn ip_version(&self) -> IpVersion {
        if self.ipv6 {
            IpVersion::V6
        } else if self.ipv4 {
            IpVersion::V4
        } else {
            IpVersion::Any
        }
    }

    pub fn cache_mode(&self, cache_enabled: bool) -> CacheMode {
        match (cache_enabled, self.no_cache) {
            (false, _) => CacheMode::Disabled,
            (true, true) => CacheMode::WriteOnly,
            (true, false) => CacheMode::ReadWrite,
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(&["pubip"], IpVersion::Any)]
    #[case(&["pubip", "-4"], IpVersion::V4)]
    #[case(&["pubip", "-6", "-v"], IpVersion::V6)]
    #[case(&["pubip", "--ipv6"], IpVersion::V6)]
    fn family_flags(#[case] argv: &[&str], #[case] expected: IpVersion) {
        let args = Args::try_parse_from(argv).unwrap();
        assert_eq!(args.ip_version(), expected);
    }

    #[rstest]
    #[case(&["pubip", "-4", "-6"])]
    #[case(&["pubip", "--both", "-4"])]
    #[case(&["pubip", "--parallel", "0"])]
    fn rejects_invalid_combinations(#[case] argv: &[&str]) {
        assert!(Args::try_parse_from(argv).is_err());
    }

    #[test]
    fn cache_mode_follows_flag_and_settings() {
        let args = Args::try_parse_from(["pubip", "--no-cache", "-p", "3"]).unwrap();
        assert_eq!(args.parallel, Some(3));
        assert_eq!(args.cache_mode(true), CacheMode::WriteOnly);
        assert_eq!(args.cache_mode(false), CacheMode::Disabled);

        let args = Args::try_parse_from(["pubip", "--both"]).unwrap();
        assert!(args.both);
        assert_eq!(args.cache_mode(true), CacheMode::ReadWrite);
    }
}
