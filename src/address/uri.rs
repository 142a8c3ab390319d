//! Endpoint URIs of the form `scheme://host:port/path`.
//!
//! Every component is optional so that partially specified addresses such as
//! `tcp://:9701` or `any` can be carried until normalization fills the gaps.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Scheme of TCP transports.
pub const TCP_SCHEME: &str = "tcp";
/// Scheme of HTTP transports.
pub const HTTP_SCHEME: &str = "http";
/// The only scheme a multicast address may carry.
pub const UDP_SCHEME: &str = "udp";

static URI_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(?P<scheme>[A-Za-z][A-Za-z0-9+.\-]*)://)?(?P<host>\[[0-9A-Fa-f:.]*\]|[^:/\[\]\s]*)(?::(?P<port>\d*))?(?P<path>/\S*)?$",
    )
    .expect("URI pattern is valid")
});

/// Errors produced when parsing a URI string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UriError {
    #[error("empty URI")]
    Empty,

    #[error("malformed URI: {0}")]
    Malformed(String),

    #[error("port out of range in URI: {0}")]
    PortOutOfRange(String),
}

/// A possibly incomplete endpoint URI.
///
/// Equality is structural: two URIs are equal when scheme (case-insensitive,
/// stored lowercase), host, port and path all match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Uri {
    scheme: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    path: Option<String>,
}

impl Uri {
    pub fn new(scheme: Option<&str>, host: Option<&str>, port: Option<u16>) -> Self {
        Self {
            scheme: scheme.filter(|s| !s.is_empty()).map(str::to_ascii_lowercase),
            host: host.filter(|h| !h.is_empty()).map(str::to_string),
            port,
            path: None,
        }
    }

    pub fn scheme(&self) -> Option<&str> {
        self.scheme.as_deref()
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn has_scheme(&self, scheme: &str) -> bool {
        self.scheme
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case(scheme))
    }

    pub fn with_scheme(mut self, scheme: &str) -> Self {
        self.scheme = Some(scheme.to_ascii_lowercase());
        self
    }

    pub fn with_host(mut self, host: &str) -> Self {
        self.host = Some(host.to_string()).filter(|h| !h.is_empty());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// True when scheme, host and port are all present.
    pub fn is_complete(&self) -> bool {
        self.scheme.is_some() && self.host.is_some() && self.port.is_some()
    }

    /// Fill only the components missing here from `model`.
    pub fn fill_from(&self, model: &Uri) -> Uri {
        Uri {
            scheme: self.scheme.clone().or_else(|| model.scheme.clone()),
            host: self.host.clone().or_else(|| model.host.clone()),
            port: self.port.or(model.port),
            path: self.path.clone().or_else(|| model.path.clone()),
        }
    }
}

impl FromStr for Uri {
    type Err = UriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(UriError::Empty);
        }

        let caps = URI_PATTERN
            .captures(s)
            .ok_or_else(|| UriError::Malformed(s.to_string()))?;

        let host = caps
            .name("host")
            .map(|m| m.as_str().trim_start_matches('[').trim_end_matches(']'))
            .filter(|h| !h.is_empty());

        let port = match caps.name("port").map(|m| m.as_str()).filter(|p| !p.is_empty()) {
            Some(p) => Some(
                p.parse::<u16>()
                    .map_err(|_| UriError::PortOutOfRange(s.to_string()))?,
            ),
            None => None,
        };

        let mut uri = Uri::new(caps.name("scheme").map(|m| m.as_str()), host, port);
        uri.path = caps
            .name("path")
            .map(|m| m.as_str().to_string())
            .filter(|p| !p.is_empty());
        Ok(uri)
    }
}

impl TryFrom<String> for Uri {
    type Error = UriError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Uri> for String {
    fn from(uri: Uri) -> Self {
        uri.to_string()
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(scheme) = &self.scheme {
            write!(f, "{}://", scheme)?;
        }
        if let Some(host) = &self.host {
            if host.contains(':') {
                write!(f, "[{}]", host)?;
            } else {
                f.write_str(host)?;
            }
        }
        if let Some(port) = self.port {
            write!(f, ":{}", port)?;
        }
        if let Some(path) = &self.path {
            f.write_str(path)?;
        }
        Ok(())
    }
}
