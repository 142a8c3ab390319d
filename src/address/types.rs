//! Address value types aggregated by a [`Transport`](super::Transport).
//!
//! Variants are small composable records around a base [`Address`] rather
//! than a type hierarchy. All of them compare by value.

use super::uri::{Uri, UDP_SCHEME};
use serde::{Deserialize, Serialize};

/// Default multicast datagram size in bytes.
pub const DEFAULT_MULTICAST_SIZE: u32 = 16384;
/// Largest datagram a multicast address may declare.
pub const MAX_MULTICAST_SIZE: u32 = 65507;

/// Errors raised when constructing an address variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("multicast address '{uri}' must use the '{}' scheme", UDP_SCHEME)]
    NotUdp { uri: String },
}

/// A bind point: a URI plus the number of ports above it that may be probed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    pub uri: Uri,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub port_range: u16,
}

fn is_zero(v: &u16) -> bool {
    *v == 0
}

impl Address {
    pub fn new(uri: Uri) -> Self {
        Self { uri, port_range: 0 }
    }

    pub fn with_port_range(uri: Uri, port_range: u16) -> Self {
        Self { uri, port_range }
    }
}

/// A NAT/firewall-visible address distinct from the local bind address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicAddress {
    #[serde(flatten)]
    pub address: Address,
    /// Advertise only this address, never the bind addresses.
    #[serde(default)]
    pub exclusive: bool,
}

impl PublicAddress {
    pub fn new(uri: Uri, exclusive: bool) -> Self {
        Self {
            address: Address::new(uri),
            exclusive,
        }
    }

    pub fn uri(&self) -> &Uri {
        &self.address.uri
    }
}

/// Outbound proxy used by a transport.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProxyAddress {
    #[serde(flatten)]
    pub address: Address,
    #[serde(default)]
    pub enabled: bool,
}

impl ProxyAddress {
    pub fn new(uri: Uri, enabled: bool) -> Self {
        Self {
            address: Address::new(uri),
            enabled,
        }
    }

    pub fn uri(&self) -> &Uri {
        &self.address.uri
    }
}

/// A UDP multicast group used for local peer discovery.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawMulticast", into = "RawMulticast")]
pub struct MulticastAddress {
    address: Address,
    is_multicast: bool,
    size: u32,
}

impl MulticastAddress {
    /// Build a multicast address, rejecting any URI whose scheme is not `udp`.
    ///
    /// A URI without a scheme is accepted and given the `udp` scheme.
    pub fn new(uri: Uri, is_multicast: bool, size: u32) -> Result<Self, AddressError> {
        let uri = match uri.scheme() {
            None => uri.with_scheme(UDP_SCHEME),
            Some(_) if uri.has_scheme(UDP_SCHEME) => uri,
            Some(_) => {
                return Err(AddressError::NotUdp {
                    uri: uri.to_string(),
                })
            }
        };
        Ok(Self {
            address: Address::new(uri),
            is_multicast,
            size,
        })
    }

    pub fn uri(&self) -> &Uri {
        &self.address.uri
    }

    pub fn is_multicast(&self) -> bool {
        self.is_multicast
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn set_multicast(&mut self, enabled: bool) {
        self.is_multicast = enabled;
    }

    pub fn set_size(&mut self, size: u32) {
        self.size = size;
    }

    /// Replace the URI, keeping the scheme restriction.
    pub fn set_uri(&mut self, uri: Uri) -> Result<(), AddressError> {
        let checked = MulticastAddress::new(uri, self.is_multicast, self.size)?;
        self.address = checked.address;
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
struct RawMulticast {
    uri: Uri,
    #[serde(default = "default_true")]
    enabled: bool,
    #[serde(default = "default_size")]
    size: u32,
}

fn default_true() -> bool {
    true
}

fn default_size() -> u32 {
    DEFAULT_MULTICAST_SIZE
}

impl TryFrom<RawMulticast> for MulticastAddress {
    type Error = AddressError;

    fn try_from(raw: RawMulticast) -> Result<Self, Self::Error> {
        MulticastAddress::new(raw.uri, raw.enabled, raw.size)
    }
}

impl From<MulticastAddress> for RawMulticast {
    fn from(m: MulticastAddress) -> Self {
        RawMulticast {
            uri: m.address.uri,
            enabled: m.is_multicast,
            size: m.size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri(s: &str) -> Uri {
        s.parse().unwrap()
    }

    #[test]
    fn test_multicast_rejects_non_udp() {
        let err = MulticastAddress::new(uri("tcp://224.0.1.85:1234"), true, 1024).unwrap_err();
        assert!(matches!(err, AddressError::NotUdp { .. }));

        let ok = MulticastAddress::new(uri("udp://224.0.1.85:1234"), true, 1024).unwrap();
        assert_eq!(ok.size(), 1024);

        let schemeless = MulticastAddress::new(uri("224.0.1.85:1234"), true, 1024).unwrap();
        assert!(schemeless.uri().has_scheme(UDP_SCHEME));
    }

    #[test]
    fn test_multicast_set_uri_keeps_restriction() {
        let mut m = MulticastAddress::new(uri("udp://224.0.1.85:1234"), true, 1024).unwrap();
        assert!(m.set_uri(uri("http://host:1")).is_err());
        assert_eq!(m.uri(), &uri("udp://224.0.1.85:1234"));
        m.set_uri(uri("udp://239.1.1.1:5000")).unwrap();
        assert_eq!(m.uri().port(), Some(5000));
    }

    #[test]
    fn test_multicast_deserialize_validates_scheme() {
        let ok: MulticastAddress = serde_yaml::from_str("uri: udp://224.0.1.85:1234\n").unwrap();
        assert!(ok.is_multicast());
        assert_eq!(ok.size(), DEFAULT_MULTICAST_SIZE);

        let bad: Result<MulticastAddress, _> = serde_yaml::from_str("uri: tcp://224.0.1.85:1234\n");
        assert!(bad.is_err());
    }

    #[test]
    fn test_public_address_equality_includes_exclusive() {
        let a = PublicAddress::new(uri("tcp://1.2.3.4:9701"), false);
        let b = PublicAddress::new(uri("tcp://1.2.3.4:9701"), false);
        let c = PublicAddress::new(uri("tcp://1.2.3.4:9701"), true);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
