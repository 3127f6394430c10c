use crate::push;
use failure::Error;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Stat cards and a spot grid fed by `/get_parking_status` plus live updates.
    Dashboard,
    /// Pre-rendered spots patched from `/api/parking/status`.
    Parking,
}

impl FromStr for View {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "dashboard" => Ok(View::Dashboard),
            "parking" => Ok(View::Parking),
            other => Err(format_err!("Unknown view '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub view: View,
    pub dashboard_poll: Duration,
    pub spot_poll: Duration,
    pub highlight: Duration,
    pub parking_spots: usize,
    pub push_enabled: bool,
    pub push_reconnect: Duration,
    pub http_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, Error> {
        Config::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let millis = |key: &str, default: u64| -> Result<Duration, Error> {
            Ok(Duration::from_millis(positive(&lookup, key, default)?))
        };
        Ok(Config {
            host: lookup("PARKING_HOST").unwrap_or_else(|| "localhost:5000".to_string()),
            view: parse(&lookup, "DASHBOARD_VIEW", View::Dashboard)?,
            dashboard_poll: millis("DASHBOARD_POLL_MS", 200)?,
            spot_poll: millis("SPOT_POLL_MS", 3000)?,
            highlight: millis("HIGHLIGHT_MS", 300)?,
            parking_spots: parse(&lookup, "PARKING_SPOTS", 12)?,
            push_enabled: parse(&lookup, "PUSH_ENABLED", true)?,
            push_reconnect: Duration::from_secs(positive(&lookup, "PUSH_RECONNECT_SECS", 10)?),
            http_timeout: millis("HTTP_TIMEOUT_MS", 2000)?,
        })
    }

    pub fn base_url(&self) -> Result<Url, Error> {
        Ok(Url::parse(&format!("http://{}/", self.host))?)
    }

    pub fn live_url(&self) -> Result<Url, Error> {
        Ok(push::live_url(&self.host)?)
    }
}

fn positive<F>(lookup: &F, key: &str, default: u64) -> Result<u64, Error>
where
    F: Fn(&str) -> Option<String>,
{
    match parse(lookup, key, default)? {
        0 => Err(format_err!("{} must be greater than zero", key)),
        value => Ok(value),
    }
}

fn parse<F, T>(lookup: &F, key: &str, default: T) -> Result<T, Error>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| format_err!("Invalid {} '{}': {}", key, raw, e)),
        None => Ok(default),
    }
}
