// Standard library
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

// 3rd party crates
use bincode::Options;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

// Project imports
use crate::utility::ip_detector::types::{DetectedIp, IpVersion};

pub const CACHE_FILE_NAME: &str = "pubip.cache";
pub const DEFAULT_CACHE_TTL_SECS: u64 = 15 * 60;

const CACHE_FORMAT_VERSION: u32 = 1;
const MAX_CACHE_FILE_BYTES: u64 = 4 * 1024;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("No {0} address in cache")]
    Empty(IpVersion),

    #[error("Value not in cache")]
    NotInCache,

    #[error("Unknown cache directory location")]
    UnresolvableStorageLocation,

    #[error("Cache file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache encoding error: {0}")]
    Encode(#[from] bincode::Error),

    #[error("Unsupported cache format version {0}")]
    UnsupportedVersion(u32),
}

/// The persisted part of the cache. Empty addresses count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
    pub v6_address: Option<String>,
    pub v6_updated_at: Option<DateTime<Utc>>,
    pub v4_address: Option<String>,
    pub v4_updated_at: Option<DateTime<Utc>>,
}

/// Last known public addresses, each valid for `ttl` after it was set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressCache {
    pub record: CacheRecord,
    ttl: TimeDelta,
}

fn codec() -> impl Options {
    bincode::DefaultOptions::new().with_limit(MAX_CACHE_FILE_BYTES)
}

impl AddressCache {
    pub fn new(ttl_seconds: u64) -> Self {
        Self::with_record(CacheRecord::default(), ttl_seconds)
    }

    pub fn with_record(record: CacheRecord, ttl_seconds: u64) -> Self {
        let ttl = i64::try_from(ttl_seconds)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX);
        Self { record, ttl }
    }

    /// Reads the cache file. A missing or unreadable file yields an empty cache.
    pub async fn load(path: &Path, ttl_seconds: u64) -> Self {
        debug!("Reading cache file {:?}", path);
        match Self::read_record(path).await {
            Ok(record) => {
                debug!("Cache file loaded");
                Self::with_record(record, ttl_seconds)
            }
            Err(e) => {
                debug!("No usable cache file: {}", e);
                Self::new(ttl_seconds)
            }
        }
    }

    async fn read_record(path: &Path) -> Result<CacheRecord, CacheError> {
        let bytes = tokio::fs::read(path).await?;
        let (version, record): (u32, CacheRecord) = codec().deserialize(&bytes)?;
        if version != CACHE_FORMAT_VERSION {
            return Err(CacheError::UnsupportedVersion(version));
        }
        Ok(record)
    }

    /// Writes the whole record next to `path` and renames it into place.
    pub async fn save(&self, path: &Path) -> Result<(), CacheError> {
        let bytes = codec().serialize(&(CACHE_FORMAT_VERSION, &self.record))?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, path).await?;

        debug!("Cache written to {:?}", path);
        Ok(())
    }

    pub fn maybe_address(&self, version: IpVersion) -> Result<String, CacheError> {
        self.maybe_address_at(version, Utc::now())
    }

    pub fn maybe_address_at(
        &self,
        version: IpVersion,
        now: DateTime<Utc>,
    ) -> Result<String, CacheError> {
        self.lookup_at(version, now).map(|detected| detected.address)
    }

    pub fn lookup(&self, version: IpVersion) -> Result<DetectedIp, CacheError> {
        self.lookup_at(version, Utc::now())
    }

    /// Returns the cached address for `version` if it is younger than the TTL,
    /// tagged with the family it was stored under.
    ///
    /// For `IpVersion::Any` a fresh IPv6 address wins over a fresh IPv4 one.
    pub fn lookup_at(
        &self,
        version: IpVersion,
        now: DateTime<Utc>,
    ) -> Result<DetectedIp, CacheError> {
        let v6 = self
            .fresh(&self.record.v6_address, self.record.v6_updated_at, now)
            .map(|address| DetectedIp {
                address,
                version: IpVersion::V6,
            });
        let v4 = self
            .fresh(&self.record.v4_address, self.record.v4_updated_at, now)
            .map(|address| DetectedIp {
                address,
                version: IpVersion::V4,
            });

        match version {
            IpVersion::V6 => v6.ok_or(CacheError::Empty(IpVersion::V6)),
            IpVersion::V4 => v4.ok_or(CacheError::Empty(IpVersion::V4)),
            IpVersion::Any => v6.or(v4).ok_or(CacheError::NotInCache),
        }
    }

    fn fresh(
        &self,
        address: &Option<String>,
        updated_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Option<String> {
        let address = address.as_deref().filter(|a| !a.is_empty())?;
        let updated_at = updated_at?;
        if now.signed_duration_since(updated_at) < self.ttl {
            Some(address.to_string())
        } else {
            None
        }
    }

    pub fn set_address(&mut self, version: IpVersion, address: &str) {
        self.set_address_at(version, address, Utc::now());
    }

    /// Replaces one family's address and timestamp, leaving the other alone.
    ///
    /// `IpVersion::Any` names no family and leaves the record unchanged.
    pub fn set_address_at(&mut self, version: IpVersion, address: &str, now: DateTime<Utc>) {
        match version {
            IpVersion::V6 => {
                self.record.v6_address = Some(address.to_string());
                self.record.v6_updated_at = Some(now);
            }
            IpVersion::V4 => {
                self.record.v4_address = Some(address.to_string());
                self.record.v4_updated_at = Some(now);
            }
            IpVersion::Any => {
                debug!("Not caching {}, no address family given", address);
                return;
            }
        }
        debug!("Cached {} address {}", version, address);
    }
}

/// Full path of the cache file, or `UnresolvableStorageLocation`.
pub fn cache_location() -> Result<PathBuf, CacheError> {
    let dir = cache_dir(
        |key| env::var_os(key),
        dirs::home_dir(),
        Some(env::temp_dir()),
    )?;
    Ok(dir.join(CACHE_FILE_NAME))
}

/// Picks the cache directory: snap dir, XDG cache, `~/.cache`, then tmp.
fn cache_dir<F>(
    lookup: F,
    home: Option<PathBuf>,
    tmp: Option<PathBuf>,
) -> Result<PathBuf, CacheError>
where
    F: Fn(&str) -> Option<OsString>,
{
    for key in ["SNAP_USER_COMMON", "XDG_CACHE_HOME"] {
        if let Some(dir) = lookup(key).filter(|d| !d.is_empty()) {
            return Ok(PathBuf::from(dir));
        }
    }

    if let Some(dot_cache) = home.map(|h| h.join(".cache")).filter(|d| d.is_dir()) {
        return Ok(dot_cache);
    }

    tmp.filter(|d| !d.as_os_str().is_empty())
        .ok_or(CacheError::UnresolvableStorageLocation)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rstest::rstest;

    use super::*;

    fn minutes_ago(minutes: i64) -> DateTime<Utc> {
        Utc::now() - TimeDelta::minutes(minutes)
    }

    fn cache(record: CacheRecord) -> AddressCache {
        AddressCache::with_record(record, DEFAULT_CACHE_TTL_SECS)
    }

    fn v6_record(address: &str, age_minutes: i64) -> CacheRecord {
        CacheRecord {
            v6_address: Some(address.to_string()),
            v6_updated_at: Some(minutes_ago(age_minutes)),
            ..Default::default()
        }
    }

    fn v4_record(address: &str, age_minutes: i64) -> CacheRecord {
        CacheRecord {
            v4_address: Some(address.to_string()),
            v4_updated_at: Some(minutes_ago(age_minutes)),
            ..Default::default()
        }
    }

    #[rstest]
    #[case(IpVersion::V6, v6_record("2001:db8::1", 14))]
    #[case(IpVersion::V4, v4_record("192.0.2.1", 14))]
    fn fresh_address_is_returned(#[case] version: IpVersion, #[case] record: CacheRecord) {
        let expected = match version {
            IpVersion::V6 => record.v6_address.clone(),
            _ => record.v4_address.clone(),
        };
        assert_eq!(cache(record).maybe_address(version).ok(), expected);
    }

    #[rstest]
    #[case(IpVersion::V6, v6_record("2001:db8::1", 16))]
    #[case(IpVersion::V4, v4_record("192.0.2.1", 16))]
    #[case(IpVersion::V6, v6_record("", 14))]
    #[case(IpVersion::V4, v4_record("", 14))]
    #[case(IpVersion::V6, v4_record("192.0.2.1", 1))]
    #[case(IpVersion::V4, CacheRecord::default())]
    fn stale_or_empty_address_is_a_miss(#[case] version: IpVersion, #[case] record: CacheRecord) {
        let result = cache(record).maybe_address(version);
        assert!(matches!(result, Err(CacheError::Empty(v)) if v == version));
    }

    #[test]
    fn any_prefers_ipv6_when_both_fresh() {
        let record = CacheRecord {
            v4_address: Some("192.0.2.1".into()),
            v4_updated_at: Some(minutes_ago(1)),
            ..v6_record("2001:db8::1", 14)
        };
        assert_eq!(
            cache(record).maybe_address(IpVersion::Any).unwrap(),
            "2001:db8::1"
        );
    }

    #[test]
    fn any_falls_back_to_ipv4() {
        let record = CacheRecord {
            v6_updated_at: Some(minutes_ago(14)),
            ..v4_record("192.0.2.1", 14)
        };
        assert_eq!(
            cache(record).lookup(IpVersion::Any).unwrap(),
            DetectedIp {
                address: "192.0.2.1".into(),
                version: IpVersion::V4,
            }
        );
    }

    #[test]
    fn any_skips_stale_ipv6() {
        let record = CacheRecord {
            v4_address: Some("192.0.2.1".into()),
            v4_updated_at: Some(minutes_ago(3)),
            ..v6_record("2001:db8::1", 30)
        };
        assert_eq!(
            cache(record).maybe_address(IpVersion::Any).unwrap(),
            "192.0.2.1"
        );
    }

    #[rstest]
    #[case(CacheRecord::default())]
    #[case(v6_record("2001:db8::1", 20))]
    #[case(v4_record("", 1))]
    fn any_without_fresh_address_is_not_in_cache(#[case] record: CacheRecord) {
        assert!(matches!(
            cache(record).maybe_address(IpVersion::Any),
            Err(CacheError::NotInCache)
        ));
    }

    #[test]
    fn ttl_is_configurable() {
        let cache = AddressCache::with_record(v4_record("192.0.2.1", 2), 60);
        assert!(cache.maybe_address(IpVersion::V4).is_err());
    }

    #[test]
    fn set_address_touches_one_family() {
        let earlier = minutes_ago(5);
        let mut cache = cache(CacheRecord {
            v4_address: Some("192.0.2.1".into()),
            v4_updated_at: Some(earlier),
            ..Default::default()
        });
        let now = Utc::now();

        cache.set_address_at(IpVersion::V6, "2001:db8::2", now);

        assert_eq!(cache.record.v6_address.as_deref(), Some("2001:db8::2"));
        assert_eq!(cache.record.v6_updated_at, Some(now));
        assert_eq!(cache.record.v4_address.as_deref(), Some("192.0.2.1"));
        assert_eq!(cache.record.v4_updated_at, Some(earlier));
    }

    #[test]
    fn set_address_without_a_family_changes_nothing() {
        let mut cache = cache(v4_record("192.0.2.1", 1));
        let before = cache.record.clone();

        cache.set_address(IpVersion::Any, "198.51.100.4");
        cache.set_address(IpVersion::Any, "garbage");

        assert_eq!(cache.record, before);
    }

    #[rstest]
    #[case(CacheRecord::default())]
    #[case(CacheRecord {
        v6_address: Some("2003:c8:9bec:4a70:e755:6628:78d1:aa06".into()),
        v6_updated_at: Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap()),
        v4_address: None,
        v4_updated_at: None,
    })]
    #[case(CacheRecord {
        v6_address: Some("".into()),
        v6_updated_at: Some(Utc::now()),
        v4_address: Some("203.0.113.9".into()),
        v4_updated_at: Some(Utc::now()),
    })]
    #[tokio::test]
    async fn save_then_load_round_trips(#[case] record: CacheRecord) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CACHE_FILE_NAME);

        cache(record.clone()).save(&path).await.unwrap();
        let loaded = AddressCache::load(&path, DEFAULT_CACHE_TTL_SECS).await;

        assert_eq!(loaded.record, record);
        assert!(!path.with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn save_overwrites_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CACHE_FILE_NAME);

        cache(v4_record("192.0.2.1", 1)).save(&path).await.unwrap();
        let second = v6_record("2001:db8::9", 0);
        cache(second.clone()).save(&path).await.unwrap();

        let loaded = AddressCache::load(&path, DEFAULT_CACHE_TTL_SECS).await;
        assert_eq!(loaded.record, second);
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = AddressCache::load(&dir.path().join("nope"), DEFAULT_CACHE_TTL_SECS).await;
        assert_eq!(loaded.record, CacheRecord::default());
    }

    #[tokio::test]
    async fn corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CACHE_FILE_NAME);
        std::fs::write(&path, b"\xff\xff\xff\xff\xff\xff\xff\xffgarbage").unwrap();

        let loaded = AddressCache::load(&path, DEFAULT_CACHE_TTL_SECS).await;
        assert_eq!(loaded.record, CacheRecord::default());
    }

    #[tokio::test]
    async fn other_format_version_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CACHE_FILE_NAME);
        let bytes = codec()
            .serialize(&(CACHE_FORMAT_VERSION + 1, &v4_record("192.0.2.1", 0)))
            .unwrap();
        std::fs::write(&path, bytes).unwrap();

        let loaded = AddressCache::load(&path, DEFAULT_CACHE_TTL_SECS).await;
        assert_eq!(loaded.record, CacheRecord::default());
    }

    fn env_of(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<OsString> {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| OsString::from(v))
        }
    }

    #[test]
    fn cache_dir_prefers_snap_then_xdg() {
        let tmp = Some(PathBuf::from("/tmp"));
        let both = env_of(&[("SNAP_USER_COMMON", "/snap/common"), ("XDG_CACHE_HOME", "/xdg")]);
        assert_eq!(cache_dir(both, None, tmp.clone()).unwrap(), PathBuf::from("/snap/common"));

        let xdg = env_of(&[("SNAP_USER_COMMON", ""), ("XDG_CACHE_HOME", "/xdg")]);
        assert_eq!(cache_dir(xdg, None, tmp).unwrap(), PathBuf::from("/xdg"));
    }

    #[test]
    fn cache_dir_uses_dot_cache_only_if_it_exists() {
        let home = tempfile::tempdir().unwrap();
        let tmp = Some(PathBuf::from("/tmp"));

        let without = cache_dir(env_of(&[]), Some(home.path().to_path_buf()), tmp.clone());
        assert_eq!(without.unwrap(), PathBuf::from("/tmp"));

        std::fs::create_dir(home.path().join(".cache")).unwrap();
        let with = cache_dir(env_of(&[]), Some(home.path().to_path_buf()), tmp);
        assert_eq!(with.unwrap(), home.path().join(".cache"));
    }

    #[test]
    fn cache_dir_without_any_candidate_is_fatal() {
        assert!(matches!(
            cache_dir(env_of(&[]), None, None),
            Err(CacheError::UnresolvableStorageLocation)
        ));
    }

    #[test]
    fn cache_location_ends_with_file_name() {
        let path = cache_location().unwrap();
        assert!(path.ends_with(CACHE_FILE_NAME));
    }
}
