//! Host configuration, read once from the environment at startup.
//!
//! Anything required and missing (map token) or structurally invalid
//! (inverted replay window) refuses to initialize, so the operator gets a
//! visible error instead of a silently blank view.

use std::net::SocketAddr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use feed::{FeedConfig, builtin_sources, find_source};
use foundation::bounds::GeoBounds;
use foundation::time::{TimeWindow, parse_utc_ms, utc_label};
use playback::FilterConfig;
use serde::Serialize;

#[derive(Debug)]
pub enum ConfigError {
    MissingToken,
    InvalidWindow { start_ms: i64, end_ms: i64 },
    Invalid { key: &'static str, value: String },
    UnknownSource { id: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingToken => {
                write!(f, "QUAKE_MAP_TOKEN is not set; refusing to start blind")
            }
            ConfigError::InvalidWindow { start_ms, end_ms } => {
                write!(f, "replay window start {start_ms} must precede end {end_ms}")
            }
            ConfigError::Invalid { key, value } => {
                write!(f, "could not parse {key}={value:?}")
            }
            ConfigError::UnknownSource { id } => {
                write!(f, "QUAKE_SOURCE_ID {id:?} is not a known feed source")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Map rendering parameters handed through to the front-end untouched.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapConfig {
    pub token: String,
    pub style_name: String,
    pub style_url: String,
    /// "bubbles" or "heatmap".
    pub layer_mode: String,
}

#[derive(Debug)]
pub struct HostConfig {
    pub addr: SocketAddr,
    pub map: MapConfig,
    pub window: TimeWindow,
    pub filter: FilterConfig,
    pub speed_hours_per_sec: f64,
    pub feed: FeedConfig,
    pub source_name: String,
    pub tick_interval: Duration,
}

impl HostConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Injectable lookup so config parsing is testable without touching
    /// process-global state.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let token = get("QUAKE_MAP_TOKEN")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingToken)?;

        let addr: SocketAddr = parse_or(&get, "QUAKE_ADDR", SocketAddr::from(([127, 0, 0, 1], 9200)))?;

        // Default window: the 24 hours leading up to startup.
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);
        let end_ms = time_var(&get, "QUAKE_WINDOW_END")?.unwrap_or(now_ms);
        let start_ms = time_var(&get, "QUAKE_WINDOW_START")?.unwrap_or(end_ms - 86_400_000);
        let window = TimeWindow::new(start_ms, end_ms);
        if !window.is_valid() {
            return Err(ConfigError::InvalidWindow { start_ms, end_ms });
        }

        let mut filter = FilterConfig::unrestricted(window);
        filter.mag_min = parse_or(&get, "QUAKE_MAG_MIN", f64::NAN)?;
        filter.mag_max = parse_or(&get, "QUAKE_MAG_MAX", f64::NAN)?;
        filter.depth_min = parse_or(&get, "QUAKE_DEPTH_MIN", f64::NAN)?;
        filter.depth_max = parse_or(&get, "QUAKE_DEPTH_MAX", f64::NAN)?;
        filter.tsunami_only = parse_or(&get, "QUAKE_TSUNAMI_ONLY", false)?;
        filter.text_query = get("QUAKE_TEXT_QUERY")
            .map(|s| s.trim().to_lowercase())
            .unwrap_or_default();
        filter.networks = get("QUAKE_NETWORKS")
            .map(|csv| {
                csv.split(',')
                    .map(|s| s.trim().to_lowercase())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        filter.bbox = bbox_var(&get, "QUAKE_BBOX")?;

        let sources = builtin_sources();
        let (remote_url, source_name) = match get("QUAKE_FEED_URL") {
            Some(url) if !url.trim().is_empty() => (Some(url.trim().to_string()), "custom".to_string()),
            _ => {
                let id = get("QUAKE_SOURCE_ID").unwrap_or_else(|| "usgs-all-day".to_string());
                let spec = find_source(&sources, &id)
                    .ok_or(ConfigError::UnknownSource { id })?;
                (Some(spec.url.clone()), spec.name.clone())
            }
        };

        let inline_payload = get("QUAKE_INLINE_SNAPSHOT").filter(|s| !s.trim().is_empty());
        let source_name = if inline_payload.is_some() {
            "inline snapshot".to_string()
        } else {
            source_name
        };

        let feed = FeedConfig {
            inline_payload,
            remote_url,
            poll_interval: Some(Duration::from_secs(parse_or(
                &get,
                "QUAKE_REFRESH_SECS",
                60u64,
            )?)),
        };

        Ok(HostConfig {
            addr,
            map: MapConfig {
                token,
                style_name: get("QUAKE_MAP_STYLE_NAME").unwrap_or_else(|| "Dark".to_string()),
                style_url: get("QUAKE_MAP_STYLE_URL")
                    .unwrap_or_else(|| "mapbox://styles/mapbox/dark-v11".to_string()),
                layer_mode: match get("QUAKE_LAYER_MODE").as_deref() {
                    Some("heatmap") => "heatmap".to_string(),
                    _ => "bubbles".to_string(),
                },
            },
            window,
            filter,
            speed_hours_per_sec: parse_or(&get, "QUAKE_SPEED_HPS", 1.0)?,
            feed,
            source_name,
            tick_interval: Duration::from_millis(parse_or(&get, "QUAKE_TICK_MS", 100u64)?),
        })
    }
}

/// Render-facing snapshot of the session configuration, served at `/config`.
///
/// Non-finite filter bounds are reported as absent rather than leaking NaN
/// into JSON.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSummary {
    pub map: MapConfig,
    pub window_start_ms: i64,
    pub window_end_ms: i64,
    pub window_start_label: String,
    pub window_end_label: String,
    pub speed_hours_per_sec: f64,
    pub mag_min: Option<f64>,
    pub mag_max: Option<f64>,
    pub depth_min: Option<f64>,
    pub depth_max: Option<f64>,
    pub tsunami_only: bool,
    pub text_query: String,
    pub networks: Vec<String>,
    pub bbox: Option<[f64; 4]>,
    pub source: String,
    pub refresh_secs: Option<u64>,
}

impl HostConfig {
    pub fn summary(&self) -> ConfigSummary {
        let finite = |v: f64| v.is_finite().then_some(v);
        ConfigSummary {
            map: self.map.clone(),
            window_start_ms: self.window.start_ms,
            window_end_ms: self.window.end_ms,
            window_start_label: utc_label(self.window.start_ms),
            window_end_label: utc_label(self.window.end_ms),
            speed_hours_per_sec: self.speed_hours_per_sec,
            mag_min: finite(self.filter.mag_min),
            mag_max: finite(self.filter.mag_max),
            depth_min: finite(self.filter.depth_min),
            depth_max: finite(self.filter.depth_max),
            tsunami_only: self.filter.tsunami_only,
            text_query: self.filter.text_query.clone(),
            networks: self.filter.networks.clone(),
            bbox: self
                .filter
                .bbox
                .map(|b| [b.min_lon, b.min_lat, b.max_lon, b.max_lat]),
            source: self.source_name.clone(),
            refresh_secs: if self.feed.inline_payload.is_some() {
                None
            } else {
                self.feed.poll_interval.map(|d| d.as_secs())
            },
        }
    }
}

fn parse_or<T: std::str::FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
        None => Ok(default),
    }
}

/// Epoch milliseconds or a UTC timestamp string.
fn time_var(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<i64>, ConfigError> {
    let Some(raw) = get(key) else {
        return Ok(None);
    };
    let raw = raw.trim().to_string();
    if let Ok(ms) = raw.parse::<i64>() {
        return Ok(Some(ms));
    }
    parse_utc_ms(&raw)
        .map(Some)
        .ok_or(ConfigError::Invalid { key, value: raw })
}

/// "minLon,minLat,maxLon,maxLat".
fn bbox_var(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<GeoBounds>, ConfigError> {
    let Some(raw) = get(key) else {
        return Ok(None);
    };
    if raw.trim().is_empty() {
        return Ok(None);
    }

    let parts: Vec<f64> = raw
        .split(',')
        .filter_map(|s| s.trim().parse::<f64>().ok())
        .collect();
    if parts.len() != 4 {
        return Err(ConfigError::Invalid { key, value: raw });
    }
    Ok(Some(GeoBounds::new(parts[0], parts[1], parts[2], parts[3])))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::{ConfigError, HostConfig};

    fn base_env() -> HashMap<&'static str, String> {
        let mut env = HashMap::new();
        env.insert("QUAKE_MAP_TOKEN", "pk.test".to_string());
        env.insert("QUAKE_WINDOW_START", "0".to_string());
        env.insert("QUAKE_WINDOW_END", "86400000".to_string());
        env
    }

    fn load(env: &HashMap<&'static str, String>) -> Result<HostConfig, ConfigError> {
        HostConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn missing_token_is_fatal() {
        let mut env = base_env();
        env.remove("QUAKE_MAP_TOKEN");
        assert!(matches!(load(&env), Err(ConfigError::MissingToken)));
    }

    #[test]
    fn inverted_window_is_fatal() {
        let mut env = base_env();
        env.insert("QUAKE_WINDOW_START", "99999999999".to_string());
        assert!(matches!(
            load(&env),
            Err(ConfigError::InvalidWindow { .. })
        ));
    }

    #[test]
    fn window_accepts_utc_strings() {
        let mut env = base_env();
        env.insert("QUAKE_WINDOW_START", "1970-01-01 00:00:00".to_string());
        env.insert("QUAKE_WINDOW_END", "1970-01-02 00:00:00".to_string());
        let config = load(&env).unwrap();
        assert_eq!(config.window.start_ms, 0);
        assert_eq!(config.window.end_ms, 86_400_000);
    }

    #[test]
    fn filters_parse_with_unbounded_defaults() {
        let mut env = base_env();
        env.insert("QUAKE_MAG_MIN", "5.0".to_string());
        env.insert("QUAKE_NETWORKS", "US, ak ,".to_string());
        env.insert("QUAKE_BBOX", "-10,-20,10,20".to_string());
        let config = load(&env).unwrap();

        assert_eq!(config.filter.mag_min, 5.0);
        assert!(config.filter.mag_max.is_nan());
        assert_eq!(config.filter.networks, vec!["us", "ak"]);
        let bbox = config.filter.bbox.unwrap();
        assert_eq!(bbox.min_lon, -10.0);
        assert_eq!(bbox.max_lat, 20.0);
    }

    #[test]
    fn inline_snapshot_renames_the_source() {
        let mut env = base_env();
        env.insert(
            "QUAKE_INLINE_SNAPSHOT",
            r#"{ "features": [] }"#.to_string(),
        );
        let config = load(&env).unwrap();
        assert_eq!(config.source_name, "inline snapshot");
        assert!(config.feed.inline_payload.is_some());
    }

    #[test]
    fn unknown_source_id_is_rejected() {
        let mut env = base_env();
        env.insert("QUAKE_SOURCE_ID", "nope".to_string());
        assert!(matches!(load(&env), Err(ConfigError::UnknownSource { .. })));
    }
}
