//! Transport definitions: a scheme plus the addresses it binds and advertises.

use super::types::{Address, MulticastAddress, ProxyAddress, PublicAddress};
use super::uri::{HTTP_SCHEME, TCP_SCHEME};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Message transports a peer can be configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportScheme {
    Tcp,
    Http,
}

impl TransportScheme {
    pub const ALL: [TransportScheme; 2] = [TransportScheme::Tcp, TransportScheme::Http];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransportScheme::Tcp => TCP_SCHEME,
            TransportScheme::Http => HTTP_SCHEME,
        }
    }
}

impl fmt::Display for TransportScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            TCP_SCHEME => Ok(TransportScheme::Tcp),
            HTTP_SCHEME => Ok(TransportScheme::Http),
            other => Err(format!("unknown transport scheme '{}'", other)),
        }
    }
}

/// Configuration of one message transport.
///
/// Address lists never hold two equal entries: adding an address that is
/// already present by value is a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transport {
    pub scheme: TransportScheme,
    pub enabled: bool,
    pub incoming: bool,
    pub outgoing: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    addresses: Vec<Address>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    public_addresses: Vec<PublicAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    proxy: Option<ProxyAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    multicast: Option<MulticastAddress>,
}

impl Transport {
    pub fn new(scheme: TransportScheme) -> Self {
        Self {
            scheme,
            enabled: false,
            incoming: false,
            outgoing: false,
            addresses: Vec::new(),
            public_addresses: Vec::new(),
            proxy: None,
            multicast: None,
        }
    }

    pub fn addresses(&self) -> &[Address] {
        &self.addresses
    }

    pub fn addresses_mut(&mut self) -> &mut [Address] {
        &mut self.addresses
    }

    /// Add a bind address. Returns false if an equal address already exists.
    pub fn add_address(&mut self, address: Address) -> bool {
        if self.addresses.contains(&address) {
            return false;
        }
        self.addresses.push(address);
        true
    }

    /// Remove a bind address by value. Returns true if it was present.
    pub fn remove_address(&mut self, address: &Address) -> bool {
        let before = self.addresses.len();
        self.addresses.retain(|a| a != address);
        if self.addresses.is_empty() {
            self.addresses = Vec::new();
        }
        self.addresses.len() != before
    }

    pub fn clear_addresses(&mut self) {
        self.addresses = Vec::new();
    }

    pub fn public_addresses(&self) -> &[PublicAddress] {
        &self.public_addresses
    }

    pub fn public_addresses_mut(&mut self) -> &mut [PublicAddress] {
        &mut self.public_addresses
    }

    pub fn add_public_address(&mut self, address: PublicAddress) -> bool {
        if self.public_addresses.contains(&address) {
            return false;
        }
        self.public_addresses.push(address);
        true
    }

    pub fn remove_public_address(&mut self, address: &PublicAddress) -> bool {
        let before = self.public_addresses.len();
        self.public_addresses.retain(|a| a != address);
        if self.public_addresses.is_empty() {
            self.public_addresses = Vec::new();
        }
        self.public_addresses.len() != before
    }

    pub fn clear_public_addresses(&mut self) {
        self.public_addresses = Vec::new();
    }

    pub fn proxy(&self) -> Option<&ProxyAddress> {
        self.proxy.as_ref()
    }

    pub fn set_proxy(&mut self, proxy: Option<ProxyAddress>) {
        self.proxy = proxy;
    }

    pub fn multicast(&self) -> Option<&MulticastAddress> {
        self.multicast.as_ref()
    }

    pub fn multicast_mut(&mut self) -> Option<&mut MulticastAddress> {
        self.multicast.as_mut()
    }

    pub fn set_multicast(&mut self, multicast: Option<MulticastAddress>) {
        self.multicast = multicast;
    }

    /// True if at least one bind or public address is configured.
    pub fn has_any_address(&self) -> bool {
        !self.addresses.is_empty() || !self.public_addresses.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Uri;

    fn addr(s: &str) -> Address {
        Address::with_port_range(s.parse::<Uri>().unwrap(), 10)
    }

    #[test]
    fn test_add_address_deduplicates_by_value() {
        let mut t = Transport::new(TransportScheme::Tcp);
        assert!(t.add_address(addr("tcp://0.0.0.0:9701")));
        // A distinct but equal value must not be added twice
        assert!(!t.add_address(addr("tcp://0.0.0.0:9701")));
        assert!(t.add_address(addr("tcp://0.0.0.0:9702")));
        assert_eq!(t.addresses().len(), 2);
    }

    #[test]
    fn test_remove_last_address_collapses_to_empty() {
        let mut t = Transport::new(TransportScheme::Tcp);
        let a = addr("tcp://0.0.0.0:9701");
        t.add_address(a.clone());
        assert!(t.remove_address(&a));
        assert!(t.addresses().is_empty());
        assert!(!t.has_any_address());
        assert!(!t.remove_address(&a));
    }

    #[test]
    fn test_public_addresses_count_as_addresses() {
        let mut t = Transport::new(TransportScheme::Http);
        let public = PublicAddress::new("http://203.0.113.7:80".parse().unwrap(), true);
        assert!(t.add_public_address(public.clone()));
        assert!(!t.add_public_address(public.clone()));
        assert!(t.has_any_address());
        assert!(t.remove_public_address(&public));
        assert!(!t.has_any_address());
    }

    #[test]
    fn test_scheme_parsing() {
        assert_eq!("TCP".parse::<TransportScheme>(), Ok(TransportScheme::Tcp));
        assert_eq!("http".parse::<TransportScheme>(), Ok(TransportScheme::Http));
        assert!("udp".parse::<TransportScheme>().is_err());
    }
}
