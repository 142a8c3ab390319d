//! Compile-time defaults, and the sentinel seed URIs.
//!
//! These are the values a baseline (`overlay = true`) profile falls back to
//! for every key it omits.

use crate::address::types::DEFAULT_MULTICAST_SIZE;
use crate::address::{Address, TransportScheme, Uri, HTTP_SCHEME, TCP_SCHEME, UDP_SCHEME};
use crate::descriptor::{GroupSettings, RelaySettings, RendezvousSettings};
use crate::utils::net_probe;
use std::time::Duration;

pub const PEER_NAME: &str = "unnamed peer";
pub const LOG_LEVEL: &str = "info";
pub const PEER_ID_PREFIX: &str = "urn:peer:";

pub const PORT_RANGE: u16 = 100;
pub const ENDPOINT_QUEUE_SIZE: u32 = 20;
pub const MULTICAST_SIZE: u32 = DEFAULT_MULTICAST_SIZE;

pub const RELAY_MAX_CLIENTS: u32 = 150;
pub const RELAY_MAX_RELAYS: u32 = 1;
pub const RELAY_CLIENT_LEASE: Duration = Duration::from_secs(2 * 60 * 60);
pub const RELAY_LEASE: Duration = Duration::from_secs(20 * 60);
pub const RELAY_QUEUE_SIZE: u32 = 20;

pub const GROUP_ID: &str = "urn:group:net";
pub const GROUP_NAME: &str = "NetGroup";
pub const GROUP_DESCRIPTION: &str = "Default infrastructure group";

/// Host of every sentinel seed URI.
pub const SENTINEL_HOST: &str = "any";

/// Scheme-less sentinel: accept seeds of any scheme from the bootstrap.
pub fn any_seed() -> Uri {
    Uri::new(None, Some(SENTINEL_HOST), None)
}

pub fn any_tcp_seed() -> Uri {
    Uri::new(Some(TCP_SCHEME), Some(SENTINEL_HOST), None)
}

pub fn any_http_seed() -> Uri {
    Uri::new(Some(HTTP_SCHEME), Some(SENTINEL_HOST), None)
}

/// If `uri` is a sentinel, the scheme filter it stands for (`None` = any).
pub fn sentinel_scheme(uri: &Uri) -> Option<Option<&str>> {
    let is_sentinel = uri
        .host()
        .is_some_and(|h| h.eq_ignore_ascii_case(SENTINEL_HOST))
        && uri.port().is_none()
        && uri.path().is_none();
    if !is_sentinel {
        return None;
    }
    match uri.scheme() {
        None => Some(None),
        Some(scheme) if scheme == TCP_SCHEME || scheme == HTTP_SCHEME => Some(Some(scheme)),
        Some(_) => None,
    }
}

/// Enabled/incoming/outgoing flags of a freshly defaulted transport.
pub fn transport_flags(scheme: TransportScheme) -> (bool, bool, bool) {
    match scheme {
        TransportScheme::Tcp => (true, true, true),
        TransportScheme::Http => (false, false, true),
    }
}

/// Bind address a defaulted transport starts with.
pub fn bind_address(scheme: TransportScheme) -> Option<Address> {
    net_probe::model(scheme.as_str(), None).map(|uri| Address::with_port_range(uri, PORT_RANGE))
}

pub fn multicast_uri() -> Option<Uri> {
    net_probe::model(UDP_SCHEME, None)
}

pub fn rendezvous() -> RendezvousSettings {
    RendezvousSettings {
        enabled: false,
        auto_start: Duration::ZERO,
        seeds: Vec::new(),
        bootstrap: None,
        discovery: true,
    }
}

pub fn relay() -> RelaySettings {
    RelaySettings {
        incoming: false,
        outgoing: false,
        max_clients: RELAY_MAX_CLIENTS,
        max_relays: RELAY_MAX_RELAYS,
        client_lease: RELAY_CLIENT_LEASE,
        relay_lease: RELAY_LEASE,
        queue_size: RELAY_QUEUE_SIZE,
        seeds: Vec::new(),
        bootstrap: None,
        discovery: true,
    }
}

pub fn group() -> GroupSettings {
    GroupSettings {
        id: GROUP_ID.to_string(),
        name: GROUP_NAME.to_string(),
        description: GROUP_DESCRIPTION.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinels_are_recognized() {
        assert_eq!(sentinel_scheme(&any_seed()), Some(None));
        assert_eq!(sentinel_scheme(&any_tcp_seed()), Some(Some("tcp")));
        assert_eq!(sentinel_scheme(&"http://ANY".parse().unwrap()), Some(Some("http")));
        assert_eq!(sentinel_scheme(&"any".parse().unwrap()), Some(None));
    }

    #[test]
    fn test_real_seeds_are_not_sentinels() {
        assert_eq!(sentinel_scheme(&"tcp://any:9701".parse().unwrap()), None);
        assert_eq!(sentinel_scheme(&"tcp://192.0.2.1:9701".parse().unwrap()), None);
        assert_eq!(sentinel_scheme(&"udp://any".parse().unwrap()), None);
    }

    #[test]
    fn test_default_bind_addresses() {
        let tcp = bind_address(TransportScheme::Tcp).unwrap();
        assert_eq!(tcp.uri.to_string(), "tcp://0.0.0.0:9701");
        assert_eq!(tcp.port_range, PORT_RANGE);
        assert_eq!(bind_address(TransportScheme::Http).unwrap().uri.port(), Some(9700));
    }
}
