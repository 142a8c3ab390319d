//! Scheme-aware address defaulting and live port probing.
//!
//! Partially specified addresses are completed from a per-scheme "model"
//! URI. Bind addresses can then be probed: ports in
//! `[port, port + port_range]` are tried in order and the first one a local
//! TCP bind succeeds on is kept.

use crate::address::{Address, Uri, HTTP_SCHEME, TCP_SCHEME, UDP_SCHEME};
use std::net::{IpAddr, SocketAddr, TcpListener, ToSocketAddrs};

/// Host used when an address does not name one: bind on every interface.
pub const WILDCARD_HOST: &str = "0.0.0.0";
/// Default TCP transport port
pub const DEFAULT_TCP_PORT: u16 = 9701;
/// Default HTTP transport port
pub const DEFAULT_HTTP_PORT: u16 = 9700;
/// Default multicast discovery group
pub const DEFAULT_MULTICAST_GROUP: &str = "224.0.1.85";
/// Default multicast discovery port
pub const DEFAULT_MULTICAST_PORT: u16 = 1234;

/// Canonical "any address" URI for a scheme.
///
/// `port` of `None` selects the scheme's default port. Returns `None` for
/// schemes without a model.
pub fn model(scheme: &str, port: Option<u16>) -> Option<Uri> {
    let (host, default_port) = match scheme.to_ascii_lowercase().as_str() {
        TCP_SCHEME => (WILDCARD_HOST, DEFAULT_TCP_PORT),
        HTTP_SCHEME => (WILDCARD_HOST, DEFAULT_HTTP_PORT),
        UDP_SCHEME => (DEFAULT_MULTICAST_GROUP, DEFAULT_MULTICAST_PORT),
        _ => return None,
    };
    Some(Uri::new(
        Some(scheme),
        Some(host),
        Some(port.unwrap_or(default_port)),
    ))
}

/// Complete `address` from `model` and optionally probe for a free port.
///
/// Only missing components are taken from the model. When `do_port_scan`
/// is set and the host resolves, the first port in
/// `[port, port + port_range]` that can be bound locally replaces the
/// configured one. If none is free, or the host cannot be resolved, the
/// configured port is kept. Port 0 means "dynamic" and is never probed.
pub fn normalize(address: &Address, do_port_scan: bool, model: &Uri) -> Uri {
    let filled = address.uri.fill_from(model);
    if !do_port_scan {
        return filled;
    }

    let (host, port) = match (filled.host(), filled.port()) {
        (Some(host), Some(port)) if port != 0 => (host, port),
        _ => return filled,
    };

    let ip = match resolve_host(host, port) {
        Some(ip) => ip,
        None => {
            log::debug!("Cannot resolve host '{}', keeping port {}", host, port);
            return filled;
        }
    };

    match find_available_port(ip, port, address.port_range) {
        Some(free) => {
            if free != port {
                log::info!(
                    "Port {} on {} is busy, using {} instead",
                    port, host, free
                );
            }
            filled.with_port(free)
        }
        None => {
            log::warn!(
                "No free port in {}..={} on {}, keeping {}",
                port,
                port.saturating_add(address.port_range),
                host,
                port
            );
            filled
        }
    }
}

/// Scan `[base, base + range]` inclusive for the first bindable port.
pub fn find_available_port(ip: IpAddr, base: u16, range: u16) -> Option<u16> {
    let last = base.saturating_add(range);
    (base..=last).find(|&port| is_port_available(ip, port))
}

/// True if a TCP listener can be bound on `ip:port`.
///
/// The probe socket is closed before returning; a failed bind is reported
/// as "unavailable" rather than as an error.
pub fn is_port_available(ip: IpAddr, port: u16) -> bool {
    match TcpListener::bind(SocketAddr::new(ip, port)) {
        Ok(listener) => {
            drop(listener);
            true
        }
        Err(e) => {
            log::debug!("Bind probe on {}:{} failed: {}", ip, port, e);
            false
        }
    }
}

fn resolve_host(host: &str, port: u16) -> Option<IpAddr> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Some(ip);
    }
    (host, port)
        .to_socket_addrs()
        .ok()?
        .next()
        .map(|addr| addr.ip())
}

/// Check an address against scheme, host and port requirements.
///
/// Returns one human-readable message per violation; empty means valid.
pub fn validate_address(
    uri: &Uri,
    required_scheme: &str,
    require_host: bool,
    min_port: u16,
) -> Vec<String> {
    let mut problems = Vec::new();

    match uri.scheme() {
        Some(_) if uri.has_scheme(required_scheme) => {}
        Some(other) => problems.push(format!(
            "'{}' uses scheme '{}' but '{}' is required",
            uri, other, required_scheme
        )),
        None => problems.push(format!(
            "'{}' has no scheme ('{}' is required)",
            uri, required_scheme
        )),
    }

    if require_host && uri.host().map_or(true, str::is_empty) {
        problems.push(format!("'{}' has no host", uri));
    }

    match uri.port() {
        Some(port) if port < min_port => problems.push(format!(
            "'{}' port {} is outside the valid range {}-65535",
            uri, port, min_port
        )),
        Some(_) => {}
        None => problems.push(format!("'{}' has no port", uri)),
    }

    problems
}
