//! Gap-filling pass run at the start of every resolution.
//!
//! Nothing here can fail the pipeline: bootstrap, certificate and probe
//! problems are logged and the affected values are left as they were.

use super::{defaults, Configurator};
use crate::address::{Address, PublicAddress, Uri, UDP_SCHEME};
use crate::utils::bootstrap::SeedSource;
use crate::utils::net_probe;
use log::{debug, info, warn};

impl Configurator {
    pub(super) fn normalize(&mut self) {
        replace_sentinels(
            "rendezvous",
            &mut self.rendezvous.seeds,
            self.rendezvous.bootstrap.as_ref(),
            self.seed_source.as_ref(),
        );
        replace_sentinels(
            "relay",
            &mut self.relay.seeds,
            self.relay.bootstrap.as_ref(),
            self.seed_source.as_ref(),
        );

        self.mint_credentials();
        self.fill_identity();
        self.normalize_transports();
    }

    fn mint_credentials(&mut self) {
        let (Some(principal), Some(password)) = (self.principal.as_deref(), self.password.as_ref())
        else {
            return;
        };

        match self.pki.mint_self_signed(principal, password.as_bytes()) {
            Ok(credentials) => {
                info!("Minted root certificate for principal '{}'", principal);
                self.credentials = Some(credentials);
                // dropping the Zeroizing wrapper wipes the buffer
                self.password = None;
            }
            Err(e) => warn!("Could not mint a root certificate for '{}': {}", principal, e),
        }
    }

    fn fill_identity(&mut self) {
        if self.peer_id.is_none() {
            let entropy: [u8; 32] = rand::random();
            let id = format!("{}{}", defaults::PEER_ID_PREFIX, hex::encode(entropy));
            info!("Generated peer id {}", id);
            self.peer_id = Some(id);
        }
        if self.name.is_none() {
            self.name = Some(
                self.principal
                    .clone()
                    .unwrap_or_else(|| defaults::PEER_NAME.to_string()),
            );
        }
    }

    fn normalize_transports(&mut self) {
        for transport in &mut self.transports {
            let Some(model) = net_probe::model(transport.scheme.as_str(), None) else {
                continue;
            };
            // probing a transport that will never bind would only burn ports
            let scan = transport.enabled;

            let bound: Vec<Address> = transport
                .addresses()
                .iter()
                .map(|a| {
                    Address::with_port_range(net_probe::normalize(a, scan, &model), a.port_range)
                })
                .collect();
            transport.clear_addresses();
            for address in bound {
                if !transport.add_address(address.clone()) {
                    debug!("Dropped duplicate {} address {}", transport.scheme, address.uri);
                }
            }

            let public: Vec<PublicAddress> = transport
                .public_addresses()
                .iter()
                .map(|p| PublicAddress {
                    address: Address::with_port_range(
                        net_probe::normalize(&p.address, false, &model),
                        p.address.port_range,
                    ),
                    exclusive: p.exclusive,
                })
                .collect();
            transport.clear_public_addresses();
            for address in public {
                transport.add_public_address(address);
            }

            if let (Some(multicast), Some(udp)) =
                (transport.multicast_mut(), net_probe::model(UDP_SCHEME, None))
            {
                let filled =
                    net_probe::normalize(&Address::new(multicast.uri().clone()), false, &udp);
                if let Err(e) = multicast.set_uri(filled) {
                    warn!("Keeping multicast address {}: {}", multicast.uri(), e);
                }
            }
        }
    }
}

/// Swap sentinel seeds for the addresses the bootstrap service returns.
///
/// Fetched seeds are kept when their scheme matches one of the sentinels
/// present, or unconditionally when a scheme-less sentinel was present.
fn replace_sentinels(
    service: &str,
    seeds: &mut Vec<Uri>,
    bootstrap: Option<&Uri>,
    source: &dyn SeedSource,
) {
    let filters: Vec<Option<String>> = seeds
        .iter()
        .filter_map(|seed| defaults::sentinel_scheme(seed).map(|s| s.map(str::to_string)))
        .collect();
    if filters.is_empty() {
        return;
    }
    seeds.retain(|seed| defaults::sentinel_scheme(seed).is_none());

    let Some(bootstrap) = bootstrap else {
        warn!(
            "{} seeds ask for bootstrap addresses but no {} bootstrap URI is configured",
            service, service
        );
        return;
    };

    let fetched = match source.fetch(bootstrap) {
        Ok(fetched) => fetched,
        Err(e) => {
            warn!("No {} seeds added: {}", service, e);
            return;
        }
    };

    let accept_any = filters.iter().any(Option::is_none);
    let mut added = 0;
    for uri in fetched {
        let wanted = accept_any || filters.iter().flatten().any(|scheme| uri.has_scheme(scheme));
        if wanted && !seeds.contains(&uri) {
            seeds.push(uri);
            added += 1;
        }
    }
    info!("Added {} {} seed(s) from {}", added, service, bootstrap);
}
