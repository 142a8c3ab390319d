//! Configuration descriptor consumed by the overlay runtime.
//!
//! The descriptor is keyed by well-known service ids (`tcp`, `http`,
//! `endpoint`, `relay`, `rendezvous`, `membership`, `proxy`). Sections for
//! any other id are carried as raw YAML and written back untouched.

use crate::address::{Transport, TransportScheme, Uri};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Service ids with a typed section in the descriptor.
pub const KNOWN_SERVICE_IDS: [&str; 7] = [
    "tcp",
    "http",
    "endpoint",
    "relay",
    "rendezvous",
    "membership",
    "proxy",
];

/// Whether `id` names a service with a typed descriptor section.
pub fn is_known_service_id(id: &str) -> bool {
    KNOWN_SERVICE_IDS.contains(&id)
}

/// Fully resolved peer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationDescriptor {
    pub peer: PeerSettings,
    pub infrastructure: GroupSettings,
    pub services: Services,
}

impl ConfigurationDescriptor {
    /// Configured transports, tcp first.
    pub fn transports(&self) -> Vec<&Transport> {
        [&self.services.tcp, &self.services.http]
            .into_iter()
            .flatten()
            .collect()
    }

    pub fn transport(&self, scheme: TransportScheme) -> Option<&Transport> {
        match scheme {
            TransportScheme::Tcp => self.services.tcp.as_ref(),
            TransportScheme::Http => self.services.http.as_ref(),
        }
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }
}

/// Identity and diagnostics of the peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerSettings {
    pub name: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub log_level: String,
}

/// Infrastructure group the peer joins at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSettings {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Per-service parameter blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Services {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tcp: Option<Transport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<Transport>,
    pub endpoint: EndpointSettings,
    pub relay: RelaySettings,
    pub rendezvous: RendezvousSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub membership: Option<SecuritySettings>,
    pub proxy: ProxySettings,
    /// Unrecognized service ids, preserved verbatim
    #[serde(flatten)]
    pub extensions: BTreeMap<String, serde_yaml::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointSettings {
    /// Outgoing message queue size
    pub queue_size: u32,
}

/// Rendezvous service parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RendezvousSettings {
    pub enabled: bool,
    /// Delay before a peer promotes itself to rendezvous; zero disables it
    #[serde(with = "humantime_serde")]
    pub auto_start: Duration,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub seeds: Vec<Uri>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bootstrap: Option<Uri>,
    /// Whether rendezvous may also be discovered dynamically
    pub discovery: bool,
}

/// Relay service parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelaySettings {
    /// Act as a relay for other peers
    pub incoming: bool,
    /// Use relays to reach the overlay
    pub outgoing: bool,
    pub max_clients: u32,
    pub max_relays: u32,
    #[serde(with = "humantime_serde")]
    pub client_lease: Duration,
    #[serde(with = "humantime_serde")]
    pub relay_lease: Duration,
    pub queue_size: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub seeds: Vec<Uri>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bootstrap: Option<Uri>,
    pub discovery: bool,
}

/// Root identity of the peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecuritySettings {
    pub principal: String,
    /// PEM encoded root certificate
    pub root_certificate: String,
    /// Password-protected private key of the root certificate
    pub encrypted_private_key: String,
}

/// Proxy settings handed to the runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxySettings {
    pub enabled: bool,
    /// Enabled proxy of the http transport, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_proxy: Option<Uri>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESCRIPTOR: &str = r#"
peer:
  name: alpha
  id: urn:peer:0011
  log_level: info
infrastructure:
  id: urn:group:net
  name: NetGroup
services:
  tcp:
    scheme: tcp
    enabled: true
    incoming: true
    outgoing: true
    addresses:
      - uri: tcp://0.0.0.0:9701
        port_range: 100
    multicast:
      uri: udp://224.0.1.85:1234
      enabled: true
      size: 16384
  endpoint:
    queue_size: 20
  relay:
    incoming: false
    outgoing: false
    max_clients: 150
    max_relays: 1
    client_lease: 2h
    relay_lease: 20m
    queue_size: 20
    discovery: true
  rendezvous:
    enabled: false
    auto_start: 0s
    seeds:
      - tcp://192.0.2.1:9701
    discovery: true
  proxy:
    enabled: false
  urn:ext:monitoring:
    interval: 30
    targets: [a, b]
"#;

    #[test]
    fn test_descriptor_parsing() {
        let d = ConfigurationDescriptor::from_yaml(DESCRIPTOR).unwrap();
        assert_eq!(d.peer.name, "alpha");
        assert_eq!(d.transports().len(), 1);
        let tcp = d.transport(TransportScheme::Tcp).unwrap();
        assert_eq!(tcp.addresses()[0].port_range, 100);
        assert_eq!(tcp.multicast().unwrap().size(), 16384);
        assert_eq!(d.services.relay.client_lease, Duration::from_secs(7200));
        assert_eq!(d.services.rendezvous.seeds.len(), 1);
        assert!(d.services.membership.is_none());
    }

    #[test]
    fn test_unknown_services_round_trip_verbatim() {
        let d = ConfigurationDescriptor::from_yaml(DESCRIPTOR).unwrap();
        let ext = d.services.extensions.get("urn:ext:monitoring").unwrap();
        assert_eq!(ext["interval"].as_u64(), Some(30));

        let again = ConfigurationDescriptor::from_yaml(&d.to_yaml().unwrap()).unwrap();
        assert_eq!(again, d);
        for id in KNOWN_SERVICE_IDS {
            assert!(!again.services.extensions.contains_key(id));
        }
    }
}
