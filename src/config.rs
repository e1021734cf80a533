use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_POLL_SECS: u64 = 300;
pub const DEFAULT_UPDATE_GRACE_SECS: u64 = 3;

const MIN_POLL_SECS: u64 = 10;
const MAX_UPDATE_GRACE_SECS: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Api,
    Fake,
}

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub base_url: String,
    pub refresh_interval: Duration,
    pub update_grace: Duration,
    pub auto_refresh: bool,
    pub source: DataSource,
    pub export_dir: Option<PathBuf>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            refresh_interval: Duration::from_secs(DEFAULT_POLL_SECS),
            update_grace: Duration::from_secs(DEFAULT_UPDATE_GRACE_SECS),
            auto_refresh: true,
            source: DataSource::Api,
            export_dir: None,
        }
    }
}

impl DashboardConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let base_url = lookup("STATS_API_BASE_URL")
            .map(|val| val.trim().trim_end_matches('/').to_string())
            .filter(|val| !val.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let poll_secs = lookup("STATS_POLL_SECS")
            .and_then(|val| val.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_POLL_SECS)
            .max(MIN_POLL_SECS);
        let grace_secs = lookup("STATS_UPDATE_GRACE_SECS")
            .and_then(|val| val.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_UPDATE_GRACE_SECS)
            .min(MAX_UPDATE_GRACE_SECS);
        let auto_refresh = lookup("STATS_AUTO_REFRESH")
            .map(|val| parse_flag(&val))
            .unwrap_or(true);
        let source = match lookup("STATS_SOURCE")
            .unwrap_or_default()
            .trim()
            .to_lowercase()
            .as_str()
        {
            "fake" | "demo" | "offline" => DataSource::Fake,
            _ => DataSource::Api,
        };
        let export_dir = lookup("STATS_EXPORT_DIR")
            .map(|val| val.trim().to_string())
            .filter(|val| !val.is_empty())
            .map(PathBuf::from);

        Self {
            base_url,
            refresh_interval: Duration::from_secs(poll_secs),
            update_grace: Duration::from_secs(grace_secs),
            auto_refresh,
            source,
            export_dir,
        }
    }
}

fn parse_flag(raw: &str) -> bool {
    !matches!(
        raw.trim().to_lowercase().as_str(),
        "0" | "false" | "off" | "no"
    )
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use super::{DashboardConfig, DataSource, DEFAULT_BASE_URL};

    fn config_from(pairs: &[(&str, &str)]) -> DashboardConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        DashboardConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.refresh_interval, Duration::from_secs(300));
        assert_eq!(config.update_grace, Duration::from_secs(3));
        assert!(config.auto_refresh);
        assert_eq!(config.source, DataSource::Api);
        assert!(config.export_dir.is_none());
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let config = config_from(&[("STATS_API_BASE_URL", " http://stats.local:8080/api/ ")]);
        assert_eq!(config.base_url, "http://stats.local:8080/api");
    }

    #[test]
    fn poll_interval_is_clamped() {
        let config = config_from(&[("STATS_POLL_SECS", "1"), ("STATS_UPDATE_GRACE_SECS", "900")]);
        assert_eq!(config.refresh_interval, Duration::from_secs(10));
        assert_eq!(config.update_grace, Duration::from_secs(60));
    }

    #[test]
    fn auto_refresh_flag_accepts_common_off_values() {
        for raw in ["0", "false", "OFF", " no "] {
            assert!(!config_from(&[("STATS_AUTO_REFRESH", raw)]).auto_refresh);
        }
        assert!(config_from(&[("STATS_AUTO_REFRESH", "yes")]).auto_refresh);
    }

    #[test]
    fn fake_source_is_selected() {
        let config = config_from(&[("STATS_SOURCE", "Fake")]);
        assert_eq!(config.source, DataSource::Fake);
    }
}
