//! Route through relays when the peer can only bind private addresses.

use super::Optimizer;
use crate::configurator::Configurator;
use crate::registry::Registry;
use crate::utils::ip_utils::{is_private_host, is_wildcard_host};

pub const NAME: &str = "nat-relay";

/// Enables outgoing relaying when no enabled transport has a public
/// address and every incoming bind address is on a private network.
///
/// Wildcard binds say nothing about reachability and leave the relay
/// setting alone.
#[derive(Debug, Default, Clone, Copy)]
pub struct NatRelayOptimizer;

impl Optimizer for NatRelayOptimizer {
    fn name(&self) -> &'static str {
        NAME
    }

    fn optimize(&mut self, config: &mut Configurator) {
        if config.relay().outgoing {
            return;
        }

        let enabled = config.transports().iter().filter(|t| t.enabled);
        if enabled.clone().any(|t| !t.public_addresses().is_empty()) {
            return;
        }

        let hosts: Vec<&str> = enabled
            .filter(|t| t.incoming)
            .flat_map(|t| t.addresses())
            .filter_map(|a| a.uri.host())
            .collect();
        let behind_nat = !hosts.is_empty()
            && hosts
                .iter()
                .all(|h| is_private_host(h) && !is_wildcard_host(h));

        if behind_nat {
            log::info!(
                "Only private bind addresses ({}), enabling outgoing relay",
                hosts.join(", ")
            );
            config.relay_mut().outgoing = true;
        }
    }
}

pub fn register(registry: &mut Registry<dyn Optimizer>) {
    registry.register(NAME, || Box::new(NatRelayOptimizer));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::{Address, PublicAddress, TransportScheme};

    fn with_bind(host: &str) -> Configurator {
        let mut config = Configurator::new_from_defaults("/tmp/peer");
        let tcp = config.transport_entry(TransportScheme::Tcp);
        tcp.clear_addresses();
        tcp.add_address(Address::new(format!("tcp://{}:9701", host).parse().unwrap()));
        config
    }

    #[test]
    fn test_private_bind_enables_relay() {
        let mut config = with_bind("192.168.1.20");
        NatRelayOptimizer.optimize(&mut config);
        assert!(config.relay().outgoing);
    }

    #[test]
    fn test_public_or_wildcard_bind_is_left_alone() {
        for host in ["203.0.113.4", "0.0.0.0"] {
            let mut config = with_bind(host);
            NatRelayOptimizer.optimize(&mut config);
            assert!(!config.relay().outgoing, "{}", host);
        }
    }

    #[test]
    fn test_public_address_means_reachable() {
        let mut config = with_bind("10.0.0.2");
        config
            .transport_entry(TransportScheme::Tcp)
            .add_public_address(PublicAddress::new(
                "tcp://203.0.113.4:9701".parse().unwrap(),
                false,
            ));
        NatRelayOptimizer.optimize(&mut config);
        assert!(!config.relay().outgoing);
    }
}
