use crate::errors::ConfigError;
use crate::models::UserId;
use std::{env, str::FromStr, time::Duration};

pub const DEFAULT_FALLBACK_USER_ID: UserId = 470064868;

/// Where page data comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSourceKind {
    Live,
    Fixture,
}

/// How the schedule decides that a class is already booked.
///
/// `AnyUser` matches bookings by class only. `CurrentUser` also requires a
/// booking that carries a `user_id` to belong to the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BookingMatch {
    #[default]
    AnyUser,
    CurrentUser,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub backend_url: String,
    pub data_source: DataSourceKind,
    pub fallback_user_id: UserId,
    pub booking_match: BookingMatch,
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            backend_url: "http://127.0.0.1:8000".to_string(),
            data_source: DataSourceKind::Live,
            fallback_user_id: DEFAULT_FALLBACK_USER_ID,
            booking_match: BookingMatch::AnyUser,
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let data_source = match lookup("DATA_SOURCE").as_deref().map(str::trim) {
            None | Some("") | Some("live") => DataSourceKind::Live,
            Some("fixture") => DataSourceKind::Fixture,
            Some(other) => return Err(invalid("DATA_SOURCE", other)),
        };

        let booking_match = match lookup("BOOKING_MATCH").as_deref().map(str::trim) {
            None | Some("") | Some("any_user") => BookingMatch::AnyUser,
            Some("current_user") => BookingMatch::CurrentUser,
            Some(other) => return Err(invalid("BOOKING_MATCH", other)),
        };

        let backend_url = lookup("BACKEND_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or(defaults.backend_url);

        Ok(Self {
            port: parse_or("PORT", &lookup, defaults.port)?,
            backend_url,
            data_source,
            fallback_user_id: parse_or("FALLBACK_USER_ID", &lookup, defaults.fallback_user_id)?,
            booking_match,
            request_timeout: Duration::from_secs(parse_or(
                "REQUEST_TIMEOUT_SECS",
                &lookup,
                defaults.request_timeout.as_secs(),
            )?),
        })
    }
}

fn parse_or<T: FromStr>(
    key: &'static str,
    lookup: &impl Fn(&str) -> Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => {
            value.trim().parse().map_err(|_| invalid(key, &value))
        }
        _ => Ok(default),
    }
}

fn invalid(key: &'static str, value: &str) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_set() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.data_source, DataSourceKind::Live);
        assert_eq!(config.fallback_user_id, DEFAULT_FALLBACK_USER_ID);
        assert_eq!(config.booking_match, BookingMatch::AnyUser);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn reads_explicit_values() {
        let config = config_from(&[
            ("PORT", "9090"),
            ("BACKEND_URL", "http://backend:8000/"),
            ("DATA_SOURCE", "fixture"),
            ("FALLBACK_USER_ID", "42"),
            ("BOOKING_MATCH", "current_user"),
            ("REQUEST_TIMEOUT_SECS", "3"),
        ])
        .unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.backend_url, "http://backend:8000");
        assert_eq!(config.data_source, DataSourceKind::Fixture);
        assert_eq!(config.fallback_user_id, 42);
        assert_eq!(config.booking_match, BookingMatch::CurrentUser);
        assert_eq!(config.request_timeout, Duration::from_secs(3));
    }

    #[test]
    fn rejects_unknown_data_source() {
        let err = config_from(&[("DATA_SOURCE", "mock")]).unwrap_err();
        assert!(err.to_string().contains("DATA_SOURCE"));
    }

    #[test]
    fn rejects_unparseable_port() {
        assert!(config_from(&[("PORT", "eighty")]).is_err());
    }
}
