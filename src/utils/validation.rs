//! Configuration validation.
//!
//! Every check appends to one list of [`Violation`]s instead of returning
//! early, so a single pass reports every problem at once.

use crate::address::{Transport, TransportScheme, Uri, UDP_SCHEME};
use crate::address::types::MAX_MULTICAST_SIZE;
use crate::configurator::Configurator;
use crate::error::{ConfigurationError, Violation, ViolationKind};
use crate::utils::net_probe::validate_address;
use std::collections::BTreeSet;
use std::net::IpAddr;

/// Validate a normalized configuration
///
/// Checks for:
/// - A root certificate, or a principal and password to mint one
/// - At least one enabled transport
/// - A bound or public address on every enabled incoming transport
/// - Scheme, host and port of every address, and that port ranges fit
/// - Scheme, group, port and datagram size of multicast addresses
/// - A reachable relay when outgoing relaying is enabled
///
/// # Returns
/// * `Ok(())` if every check passes
/// * `Err(ConfigurationError)` listing every violation found
pub fn validate(config: &Configurator) -> Result<(), ConfigurationError> {
    let mut violations = Vec::new();

    check_security(config, &mut violations);
    check_transports(config.transports(), &mut violations);
    check_relay(config, &mut violations);

    if violations.is_empty() {
        Ok(())
    } else {
        log::debug!("Validation found {} problem(s)", violations.len());
        Err(ConfigurationError::new(violations))
    }
}

fn check_security(config: &Configurator, violations: &mut Vec<Violation>) {
    let can_mint = config.principal().is_some() && config.has_password();
    if config.credentials().is_none() && !can_mint {
        violations.push(Violation::new(
            ViolationKind::Security,
            "membership",
            "no root certificate, and no principal and password to create one",
        ));
    }
}

fn check_transports(transports: &[Transport], violations: &mut Vec<Violation>) {
    if !transports.iter().any(|t| t.enabled) {
        violations.push(Violation::new(
            ViolationKind::Transport,
            "transports",
            "no transport is enabled",
        ));
    }

    for transport in transports.iter().filter(|t| t.enabled) {
        let scheme = transport.scheme.as_str();

        if transport.incoming && !transport.has_any_address() {
            violations.push(Violation::new(
                ViolationKind::Transport,
                scheme,
                "accepts incoming connections but has no bound or public address",
            ));
        }

        let field = format!("{}.address", scheme);
        for address in transport.addresses() {
            push_address_problems(&field, &address.uri, scheme, 0, violations);
            if let Some(port) = address.uri.port().filter(|&p| p != 0) {
                if u32::from(port) + u32::from(address.port_range) > u32::from(u16::MAX) {
                    violations.push(Violation::new(
                        ViolationKind::Address,
                        field.as_str(),
                        format!(
                            "'{}' with port range {} extends past port 65535",
                            address.uri, address.port_range
                        ),
                    ));
                }
            }
        }

        let field = format!("{}.public_address", scheme);
        for public in transport.public_addresses() {
            push_address_problems(&field, public.uri(), scheme, 1, violations);
        }

        if let Some(proxy) = transport.proxy().filter(|p| p.enabled) {
            let field = format!("{}.proxy", scheme);
            let http = TransportScheme::Http.as_str();
            push_address_problems(&field, proxy.uri(), http, 1, violations);
        }

        if let Some(multicast) = transport.multicast().filter(|m| m.is_multicast()) {
            let field = format!("{}.multicast", scheme);
            let uri = multicast.uri();
            for message in validate_address(uri, UDP_SCHEME, true, 1) {
                violations.push(Violation::new(ViolationKind::Multicast, field.as_str(), message));
            }
            let is_group = uri
                .host()
                .and_then(|h| h.parse::<IpAddr>().ok())
                .is_some_and(|ip| ip.is_multicast());
            if !is_group {
                violations.push(Violation::new(
                    ViolationKind::Multicast,
                    field.as_str(),
                    format!("'{}' is not a multicast group address", uri),
                ));
            }
            if multicast.size() == 0 || multicast.size() > MAX_MULTICAST_SIZE {
                violations.push(Violation::new(
                    ViolationKind::Multicast,
                    field.as_str(),
                    format!(
                        "datagram size {} is outside the valid range 1-{}",
                        multicast.size(),
                        MAX_MULTICAST_SIZE
                    ),
                ));
            }
        }
    }
}

fn push_address_problems(
    field: &str,
    uri: &Uri,
    scheme: &str,
    min_port: u16,
    violations: &mut Vec<Violation>,
) {
    for message in validate_address(uri, scheme, true, min_port) {
        violations.push(Violation::new(ViolationKind::Address, field, message));
    }
}

fn check_relay(config: &Configurator, violations: &mut Vec<Violation>) {
    let relay = config.relay();
    if !relay.outgoing || relay.bootstrap.is_some() {
        return;
    }

    let enabled = enabled_schemes(config.transports());
    if !relay.seeds.iter().any(|seed| is_reachable_seed(seed, &enabled)) {
        violations.push(Violation::new(
            ViolationKind::Relay,
            "relay.seeds",
            "outgoing relaying is enabled with an unspecified relay: no relay bootstrap URI \
             and no seed relay on an enabled transport",
        ));
    }
}

/// Schemes of the enabled transports.
pub fn enabled_schemes(transports: &[Transport]) -> BTreeSet<TransportScheme> {
    transports.iter().filter(|t| t.enabled).map(|t| t.scheme).collect()
}

/// A seed is reachable when its scheme names one of the `enabled` transports.
///
/// Seeds without a scheme cannot be dialed and never count.
pub fn is_reachable_seed(seed: &Uri, enabled: &BTreeSet<TransportScheme>) -> bool {
    seed.scheme()
        .and_then(|s| s.parse::<TransportScheme>().ok())
        .is_some_and(|s| enabled.contains(&s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::{Address, MulticastAddress};

    fn valid() -> Configurator {
        let mut config = Configurator::new_from_defaults("/tmp/peer");
        config.set_principal("p");
        config.set_password("pw");
        let t = tcp(&mut config);
        t.clear_addresses();
        t.add_address(Address::with_port_range("tcp://127.0.0.1:9701".parse().unwrap(), 100));
        config
    }

    fn tcp(config: &mut Configurator) -> &mut Transport {
        config.transport_entry(TransportScheme::Tcp)
    }

    #[test]
    fn test_defaults_with_identity_are_valid() {
        assert!(validate(&valid()).is_ok());
    }

    #[test]
    fn test_missing_identity_and_address_are_both_reported() {
        let mut config = Configurator::new_from_defaults("/tmp/peer");
        tcp(&mut config).clear_addresses();

        let err = validate(&config).unwrap_err();
        let kinds: Vec<ViolationKind> = err.violations().iter().map(|v| v.kind).collect();
        assert!(kinds.contains(&ViolationKind::Security));
        assert!(kinds.contains(&ViolationKind::Transport));
    }

    #[test]
    fn test_no_enabled_transport() {
        let mut config = valid();
        for t in config.transports_mut() {
            t.enabled = false;
        }
        let err = validate(&config).unwrap_err();
        assert!(err.mentions("no transport is enabled"));
    }

    #[test]
    fn test_address_problems() {
        let mut config = valid();
        let t = tcp(&mut config);
        t.clear_addresses();
        t.add_address(Address::new("http://:9701".parse().unwrap()));
        t.add_address(Address::with_port_range("tcp://127.0.0.1:65530".parse().unwrap(), 10));

        let err = validate(&config).unwrap_err();
        assert!(err.mentions("scheme"));
        assert!(err.mentions("no host"));
        assert!(err.mentions("past port 65535"));
        assert_eq!(err.violations().len(), 3);
    }

    #[test]
    fn test_multicast_problems() {
        let mut config = valid();
        let m = MulticastAddress::new("udp://10.0.0.1:0".parse().unwrap(), true, 70000).unwrap();
        tcp(&mut config).set_multicast(Some(m));

        let err = validate(&config).unwrap_err();
        assert!(err.violations().iter().all(|v| v.kind == ViolationKind::Multicast));
        assert!(err.mentions("not a multicast group"));
        assert!(err.mentions("datagram size"));
        assert!(err.mentions("port 0"));
    }

    #[test]
    fn test_relay_needs_a_reachable_seed() {
        let mut config = valid();
        config.relay_mut().outgoing = true;
        assert!(validate(&config).unwrap_err().mentions("unspecified relay"));

        // seed on a disabled transport does not count
        config.add_relay_seed("http://192.0.2.1:9700".parse().unwrap());
        assert!(validate(&config).is_err());

        config.add_relay_seed("tcp://192.0.2.1:9701".parse().unwrap());
        assert!(validate(&config).is_ok());

        // a seed without a scheme cannot be dialed
        config.relay_mut().seeds = vec!["192.0.2.3:9701".parse().unwrap()];
        assert!(validate(&config).is_err());

        config.relay_mut().seeds.clear();
        config.relay_mut().bootstrap = Some("http://boot.example/relays".parse().unwrap());
        assert!(validate(&config).is_ok());
    }
}
