//! # WillyWeather Tide Forecast Fetching and Caching
//!
//! This module handles all network operations for fetching tide extrema from
//! the WillyWeather forecast API. It includes caching to avoid re-downloading
//! a long forecast on every run and falls back to an expired cache when the
//! network is unavailable.
//!
//! ## Data Source
//!
//! ### WillyWeather Forecast API
//! - **URL**: `https://api.willyweather.com.au/v2/{key}/locations/{id}/weather.json?forecasts=tides&startDate=YYYY-MM-DD&days=N`
//! - **Location**: 33211 (Victoria Point Boat Ramp) by default, configurable
//! - **Format**: JSON, `forecasts.tides.days[].entries[]`
//! - **Data**: every high and low water with `dateTime`, `height` (m) and `type`
//!
//! ### Data Processing Pipeline
//! 1. **Cache**: Reuse a matching cached forecast younger than the TTL
//! 2. **Fetch**: HTTP GET of the forecast for the requested range
//! 3. **Parse**: Flatten the per-day entries into [`TidePoint`]s
//! 4. **Store**: Write the parsed points back to the cache
//!
//! ## Error Handling
//!
//! - **Missing API key**: only blocks the download; cached forecasts still load
//! - **Network/server errors**: non-2xx responses are fetch failures
//! - **Malformed responses**: bad JSON or timestamps are parse failures
//! - **Network down**: an expired cache for the same request is used instead
//!
//! All errors propagate through the `TideError` enum; the caller decides
//! whether to fall back to the offline model.

use crate::{TideKind, TidePoint};
use chrono::{NaiveDate, NaiveDateTime};
use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use std::{env, fs, io};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Base URL of the WillyWeather v2 API
pub const API_BASE: &str = "https://api.willyweather.com.au/v2";

/// Timestamp format used by the API for `dateTime`
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// HTTP timeout for a single forecast request
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur during forecast fetching and processing.
#[derive(Error, Debug)]
pub enum TideError {
    /// No API key, so the forecast cannot be downloaded
    #[error("missing API key")]
    MissingApiKey,

    /// HTTP request failed (network, server, or protocol error)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body is not the expected JSON shape, or an entry is unreadable
    #[error("malformed forecast: {0}")]
    Parse(#[from] serde_json::Error),

    /// Cache file operations failed
    #[error("cache IO: {0}")]
    Cache(#[from] io::Error),
}

/// What to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastRequest {
    pub location_id: u32,
    pub start_date: NaiveDate,
    pub days: u32,
    /// API root, normally [`API_BASE`]
    pub api_base: String,
}

impl ForecastRequest {
    pub fn new(location_id: u32, start_date: NaiveDate, days: u32) -> Self {
        Self {
            location_id,
            start_date,
            days,
            api_base: API_BASE.to_string(),
        }
    }

    /// Forecast endpoint for this request.
    pub fn url(&self, api_key: &str) -> String {
        format!(
            "{}/{}/locations/{}/weather.json?forecasts=tides&startDate={}&days={}",
            self.api_base.trim_end_matches('/'),
            api_key,
            self.location_id,
            self.start_date.format("%Y-%m-%d"),
            self.days
        )
    }
}

/// On-disk forecast cache.
#[derive(Debug, Clone)]
pub struct Cache {
    pub path: PathBuf,
    pub ttl: Duration,
}

#[derive(Serialize, Deserialize)]
struct CachedForecast {
    location_id: u32,
    start_date: NaiveDate,
    days: u32,
    points: Vec<TidePoint>,
}

impl CachedForecast {
    fn matches(&self, request: &ForecastRequest) -> bool {
        self.location_id == request.location_id
            && self.start_date == request.start_date
            && self.days == request.days
    }
}

#[derive(Deserialize)]
struct ApiResponse {
    forecasts: Forecasts,
}

#[derive(Deserialize)]
struct Forecasts {
    tides: TideForecast,
}

#[derive(Deserialize)]
struct TideForecast {
    days: Vec<TideDay>,
}

#[derive(Deserialize)]
struct TideDay {
    entries: Vec<TideEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TideEntry {
    date_time: String,
    height: f64,
    #[serde(rename = "type")]
    kind: TideKind,
}

/// Read the API key from the environment variable `name`; unset or blank is `None`.
pub fn api_key(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
}

/// Fetch tide extrema from the cache or WillyWeather.
///
/// A fresh matching cache entry is returned without touching the network.
/// Otherwise the forecast is downloaded and cached; if that fails (or there
/// is no API key to download with) and an expired cache entry for the same
/// request exists, the expired entry is returned instead of the error.
///
/// # Example
/// ```no_run
/// use chrono::NaiveDate;
/// use std::time::Duration;
/// use tide_windows_lib::tide_data::{fetch, Cache, ForecastRequest};
///
/// # async fn run() -> Result<(), tide_windows_lib::tide_data::TideError> {
/// let request = ForecastRequest::new(33211, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(), 7);
/// let cache = Cache { path: "/tmp/tides.json".into(), ttl: Duration::from_secs(1800) };
/// let points = fetch(&request, Some("secret"), &cache).await?;
/// println!("{} extrema", points.len());
/// # Ok(())
/// # }
/// ```
pub async fn fetch(
    request: &ForecastRequest,
    api_key: Option<&str>,
    cache: &Cache,
) -> Result<Vec<TidePoint>, TideError> {
    // Try cache first
    if let Ok(points) = load_cache(&cache.path, request, Some(cache.ttl)) {
        debug!(path = %cache.path.display(), "using cached forecast");
        return Ok(points);
    }

    let downloaded = match api_key {
        Some(key) => fetch_forecast(request, key).await,
        None => Err(TideError::MissingApiKey),
    };

    match downloaded {
        Ok(points) => {
            // Save for future requests (ignore cache write failures)
            if let Err(e) = save_cache(&cache.path, request, &points) {
                warn!(error = %e, "could not write forecast cache");
            }
            Ok(points)
        }
        Err(err) => match load_cache(&cache.path, request, None) {
            Ok(points) => {
                warn!(error = %err, "forecast fetch failed, using expired cache");
                Ok(points)
            }
            Err(_) => Err(err),
        },
    }
}

/// Download and parse the forecast for `request`.
pub async fn fetch_forecast(
    request: &ForecastRequest,
    api_key: &str,
) -> Result<Vec<TidePoint>, TideError> {
    let client = reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()?;

    info!(
        location = request.location_id,
        start = %request.start_date,
        days = request.days,
        "fetching tide forecast"
    );
    let body = client
        .get(request.url(api_key))
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    let points = parse_forecast(&body)?;
    info!(extrema = points.len(), "forecast received");
    Ok(points)
}

/// Flatten a WillyWeather tides response into extrema, in response order.
pub fn parse_forecast(body: &str) -> Result<Vec<TidePoint>, TideError> {
    let response: ApiResponse = serde_json::from_str(body)?;

    response
        .forecasts
        .tides
        .days
        .into_iter()
        .flat_map(|day| day.entries)
        .map(|entry| {
            let timestamp = NaiveDateTime::parse_from_str(&entry.date_time, TIMESTAMP_FORMAT)
                .map_err(|_| {
                    serde_json::Error::custom(format!("malformed timestamp {:?}", entry.date_time))
                })?;
            Ok(TidePoint::new(timestamp, entry.height, entry.kind))
        })
        .collect()
}

// -- Cache --

fn is_fresh(modified: SystemTime, now: SystemTime, ttl: Duration) -> bool {
    match now.duration_since(modified) {
        Ok(age) => age <= ttl,
        // Modified in the future: clock skew, treat as fresh
        Err(_) => true,
    }
}

/// Load cached points for `request`. With `ttl = None` any age is accepted.
fn load_cache(
    path: &Path,
    request: &ForecastRequest,
    ttl: Option<Duration>,
) -> Result<Vec<TidePoint>, io::Error> {
    if let Some(ttl) = ttl {
        let modified = fs::metadata(path)?.modified()?;
        if !is_fresh(modified, SystemTime::now(), ttl) {
            return Err(io::Error::other("stale"));
        }
    }

    let data = fs::read(path)?;
    let cached: CachedForecast = serde_json::from_slice(&data)?;
    if !cached.matches(request) {
        return Err(io::Error::other("cache is for a different request"));
    }

    Ok(cached.points)
}

fn save_cache(path: &Path, request: &ForecastRequest, points: &[TidePoint]) -> Result<(), io::Error> {
    let cached = CachedForecast {
        location_id: request.location_id,
        start_date: request.start_date,
        days: request.days,
        points: points.to_vec(),
    };
    let data = serde_json::to_vec(&cached)?;
    fs::write(path, data)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"{
        "location": { "id": 33211, "name": "Victoria Point Boat Ramp" },
        "forecasts": {
            "tides": {
                "days": [
                    {
                        "dateTime": "2025-03-01 00:00:00",
                        "entries": [
                            { "dateTime": "2025-03-01 04:12:00", "height": 0.42, "type": "low" },
                            { "dateTime": "2025-03-01 10:31:00", "height": 2.21, "type": "high" }
                        ]
                    },
                    {
                        "dateTime": "2025-03-02 00:00:00",
                        "entries": [
                            { "dateTime": "2025-03-02 05:01:00", "height": 0.38, "type": "low" }
                        ]
                    }
                ]
            }
        }
    }"#;

    fn request() -> ForecastRequest {
        ForecastRequest::new(33211, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(), 2)
    }

    /// Same request, but downloads go to a port nothing listens on.
    fn offline_request() -> ForecastRequest {
        ForecastRequest {
            api_base: "http://127.0.0.1:9/v2".to_string(),
            ..request()
        }
    }

    fn backdate(path: &Path, by: Duration) {
        fs::File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(SystemTime::now() - by)
            .unwrap();
    }

    #[test]
    fn test_parse_flattens_days() {
        let points = parse_forecast(SAMPLE).unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(points[0].kind, TideKind::Low);
        assert_eq!(points[1].kind, TideKind::High);
        assert_eq!(points[1].height, 2.21);
        assert_eq!(
            points[2].timestamp,
            NaiveDate::from_ymd_opt(2025, 3, 2)
                .unwrap()
                .and_hms_opt(5, 1, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_parse_rejects_bad_timestamp() {
        let body = SAMPLE.replace("2025-03-01 04:12:00", "1 March 4:12am");
        match parse_forecast(&body) {
            Err(TideError::Parse(e)) => assert!(e.to_string().contains("1 March 4:12am")),
            other => panic!("expected a parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_kind() {
        let body = SAMPLE.replace("\"high\"", "\"slack\"");
        assert!(matches!(parse_forecast(&body), Err(TideError::Parse(_))));
    }

    #[test]
    fn test_url() {
        let url = request().url("KEY");
        assert_eq!(
            url,
            "https://api.willyweather.com.au/v2/KEY/locations/33211/weather.json?forecasts=tides&startDate=2025-03-01&days=2"
        );
    }

    #[test]
    fn test_url_with_other_base() {
        let url = offline_request().url("KEY");
        assert!(url.starts_with("http://127.0.0.1:9/v2/KEY/locations/33211/"));
    }

    #[test]
    fn test_missing_api_key() {
        assert_eq!(api_key("TIDE_WINDOWS_TEST_KEY_THAT_IS_NEVER_SET"), None);
    }

    #[test]
    fn test_cache_roundtrip() {
        let temp_file = NamedTempFile::new().unwrap();
        let points = parse_forecast(SAMPLE).unwrap();

        save_cache(temp_file.path(), &request(), &points).unwrap();
        let loaded =
            load_cache(temp_file.path(), &request(), Some(Duration::from_secs(1800))).unwrap();

        assert_eq!(loaded, points);
    }

    #[test]
    fn test_cache_ignores_other_requests() {
        let temp_file = NamedTempFile::new().unwrap();
        let points = parse_forecast(SAMPLE).unwrap();
        save_cache(temp_file.path(), &request(), &points).unwrap();

        let mut other = request();
        other.days = 7;
        assert!(load_cache(temp_file.path(), &other, None).is_err());
    }

    #[test]
    fn test_cache_freshness() {
        let modified = SystemTime::now();
        let ttl = Duration::from_secs(30 * 60);
        assert!(is_fresh(modified, modified + Duration::from_secs(60), ttl));
        assert!(!is_fresh(modified, modified + Duration::from_secs(2 * 3600), ttl));
    }

    #[tokio::test]
    async fn test_fetch_prefers_fresh_cache() {
        let temp_file = NamedTempFile::new().unwrap();
        let points = parse_forecast(SAMPLE).unwrap();
        save_cache(temp_file.path(), &request(), &points).unwrap();

        let cache = Cache {
            path: temp_file.path().to_path_buf(),
            ttl: Duration::from_secs(1800),
        };
        // No network access happens when the cache is fresh
        let fetched = fetch(&offline_request(), Some("unused"), &cache)
            .await
            .unwrap();
        assert_eq!(fetched, points);
    }

    #[tokio::test]
    async fn test_fetch_falls_back_to_expired_cache() {
        let temp_file = NamedTempFile::new().unwrap();
        let points = parse_forecast(SAMPLE).unwrap();
        save_cache(temp_file.path(), &request(), &points).unwrap();
        backdate(temp_file.path(), Duration::from_secs(2 * 3600));

        let cache = Cache {
            path: temp_file.path().to_path_buf(),
            ttl: Duration::from_secs(1800),
        };
        let fetched = fetch(&offline_request(), Some("KEY"), &cache)
            .await
            .unwrap();
        assert_eq!(fetched, points);
    }

    #[tokio::test]
    async fn test_fetch_without_key_uses_expired_cache() {
        let temp_file = NamedTempFile::new().unwrap();
        let points = parse_forecast(SAMPLE).unwrap();
        save_cache(temp_file.path(), &request(), &points).unwrap();
        backdate(temp_file.path(), Duration::from_secs(2 * 3600));

        let cache = Cache {
            path: temp_file.path().to_path_buf(),
            ttl: Duration::from_secs(1800),
        };
        let fetched = fetch(&offline_request(), None, &cache).await.unwrap();
        assert_eq!(fetched, points);
    }

    #[tokio::test]
    async fn test_fetch_without_key_or_cache_fails() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache {
            path: dir.path().join("missing.json"),
            ttl: Duration::from_secs(1800),
        };
        assert!(matches!(
            fetch(&offline_request(), None, &cache).await,
            Err(TideError::MissingApiKey)
        ));
    }

    #[tokio::test]
    async fn test_fetch_unreachable_without_cache_reports_http_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache {
            path: dir.path().join("missing.json"),
            ttl: Duration::from_secs(1800),
        };
        assert!(matches!(
            fetch(&offline_request(), Some("KEY"), &cache).await,
            Err(TideError::Http(_))
        ));
    }
}
