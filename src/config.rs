//! Node endpoint configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

use crate::error::{Result, RpcError};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8545;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// URI scheme of the node's JSON-RPC server
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    #[default]
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

impl FromStr for Scheme {
    type Err = RpcError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Scheme::Http),
            "https" => Ok(Scheme::Https),
            other => Err(RpcError::Configuration(format!(
                "unsupported scheme: {:?}",
                other
            ))),
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection settings for a node.
///
/// Missing fields fall back to `http://127.0.0.1:8545` when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scheme: Scheme,
    pub host: String,
    pub port: u16,
    /// Transport timeout in seconds, 0 for none
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scheme: Scheme::Http,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Extract scheme, host and port from a URL, keeping defaults for
    /// whatever the URL leaves out. Paths and query strings are ignored.
    pub fn from_url(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(RpcError::Configuration("empty url".to_string()));
        }

        let candidate = if raw.contains("://") {
            raw.to_string()
        } else {
            format!("{}://{}", Scheme::default(), raw)
        };

        let url = Url::parse(&candidate)
            .map_err(|e| RpcError::Configuration(format!("invalid url {:?}: {}", raw, e)))?;

        let scheme: Scheme = url.scheme().parse()?;
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| RpcError::Configuration(format!("invalid url {:?}: no host", raw)))?
            .to_string();

        // `Url::port` hides ports equal to the scheme default, e.g. `http://node:80`
        let port = url
            .port()
            .or_else(|| {
                has_explicit_port(&candidate)
                    .then(|| url.port_or_known_default())
                    .flatten()
            })
            .unwrap_or(DEFAULT_PORT);

        Ok(Self {
            scheme,
            host,
            port,
            ..Self::default()
        })
    }

    /// Root URL requests are posted to
    pub fn base_url(&self) -> Result<Url> {
        let host = if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };

        let raw = format!("{}://{}:{}/", self.scheme, host, self.port);
        Url::parse(&raw)
            .map_err(|e| RpcError::Configuration(format!("invalid endpoint {:?}: {}", raw, e)))
    }

    /// Transport timeout; `timeout_secs: 0` means requests never time out
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

impl FromStr for Config {
    type Err = RpcError;

    fn from_str(s: &str) -> Result<Self> {
        Config::from_url(s)
    }
}

fn has_explicit_port(url: &str) -> bool {
    let rest = url.split_once("://").map(|(_, rest)| rest).unwrap_or(url);
    let authority = rest.split(['/', '?', '#']).next().unwrap_or("");
    let host_port = authority
        .rsplit_once('@')
        .map(|(_, hp)| hp)
        .unwrap_or(authority);
    let after_host = match host_port.rfind(']') {
        Some(i) => &host_port[i + 1..],
        None => host_port,
    };
    after_host.contains(':')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.scheme, Scheme::Http);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8545);
        assert_eq!(config.base_url().unwrap().as_str(), "http://127.0.0.1:8545/");
    }

    #[test]
    fn test_from_url() {
        let config = Config::from_url("https://node.example.com:8546/some/path").unwrap();
        assert_eq!(config.scheme, Scheme::Https);
        assert_eq!(config.host, "node.example.com");
        assert_eq!(config.port, 8546);

        // no port: default port, not the scheme's well-known one
        let config = Config::from_url("https://node.example.com").unwrap();
        assert_eq!(config.port, 8545);

        // explicit well-known port is kept
        let config = Config::from_url("http://node.example.com:80").unwrap();
        assert_eq!(config.port, 80);
    }

    #[test]
    fn test_from_url_without_scheme() {
        let config: Config = "localhost:7545".parse().unwrap();
        assert_eq!(config.scheme, Scheme::Http);
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 7545);
    }

    #[test]
    fn test_from_url_ipv6() {
        let config = Config::from_url("http://[::1]:8545").unwrap();
        assert_eq!(config.host, "[::1]");
        assert_eq!(config.base_url().unwrap().as_str(), "http://[::1]:8545/");
    }

    #[test]
    fn test_from_url_invalid() {
        for url in ["", "http://", "ftp://node.example.com", "http://node:notaport"] {
            assert!(
                matches!(Config::from_url(url), Err(RpcError::Configuration(_))),
                "accepted {:?}",
                url
            );
        }
    }

    #[test]
    fn test_deserialize_merges_defaults() {
        let config: Config =
            serde_json::from_value(serde_json::json!({"host": "geth", "scheme": "https"}))
                .unwrap();
        assert_eq!(config.scheme, Scheme::Https);
        assert_eq!(config.host, "geth");
        assert_eq!(config.port, 8545);
        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));

        let config = Config {
            timeout_secs: 0,
            ..Config::default()
        };
        assert_eq!(config.timeout(), None);
    }

    #[test]
    fn test_scheme_parse() {
        assert_eq!("HTTPS".parse::<Scheme>().unwrap(), Scheme::Https);
        assert!("ws".parse::<Scheme>().is_err());
    }
}
