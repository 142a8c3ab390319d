//! # Configuration state
//!
//! [`Configurator`] is the mutable builder behind a resolved
//! [`ConfigurationDescriptor`]. Layers are applied in a fixed order:
//!
//! 1. compile-time [`defaults`]
//! 2. the built-in seed profile as a baseline (`overlay = true`)
//! 3. a persisted descriptor, which fully supersedes the seed values
//! 4. explicit profiles as incremental layers (`overlay = false`)
//! 5. programmatic setters
//!
//! [`Configurator::resolve`] then runs normalize, the optimizer chain,
//! validation and the final build, always in that order.
//!
//! ## Example
//!
//! ```no_run
//! use peercfg::configurator::Configurator;
//!
//! let mut config = Configurator::new_from_defaults("/var/lib/peer");
//! config.set_name("alpha");
//! config.set_principal("alpha");
//! config.set_password("correct horse");
//!
//! let descriptor = config.resolve()?;
//! println!("{}", descriptor.peer.id);
//! # Ok::<(), peercfg::error::ConfigurationError>(())
//! ```

pub mod apply;
pub mod defaults;
mod normalize;

use crate::address::{Transport, TransportScheme, Uri};
use crate::descriptor::{
    is_known_service_id, ConfigurationDescriptor, EndpointSettings, GroupSettings, PeerSettings,
    ProxySettings, RelaySettings, RendezvousSettings, SecuritySettings, Services,
};
use crate::descriptor_store;
use crate::error::ConfigurationError;
use crate::optimizer::{self, Optimizer, OptimizerChain};
use crate::pki::{Credentials, Pki, RcgenPki};
use crate::profile::{builtin, Profile};
use crate::registry::Registry;
use crate::utils::bootstrap::{HttpSeedFetcher, SeedSource};
use crate::utils::validation;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

/// Mutable configuration of one peer, prior to resolution.
pub struct Configurator {
    home: PathBuf,
    name: Option<String>,
    peer_id: Option<String>,
    description: Option<String>,
    log_level: String,
    principal: Option<String>,
    password: Option<Zeroizing<String>>,
    credentials: Option<Credentials>,
    transports: Vec<Transport>,
    rendezvous: RendezvousSettings,
    relay: RelaySettings,
    endpoint_queue_size: u32,
    proxy_enabled: bool,
    infrastructure: GroupSettings,
    extensions: BTreeMap<String, serde_yaml::Value>,
    optimizers: OptimizerChain,
    registry: Registry<dyn Optimizer>,
    seed_source: Box<dyn SeedSource>,
    pki: Box<dyn Pki>,
}

impl Configurator {
    /// State holding only the compile-time defaults.
    fn with_defaults(home: PathBuf) -> Self {
        let mut registry = Registry::new();
        optimizer::register_builtin(&mut registry);

        let transports = TransportScheme::ALL
            .into_iter()
            .map(|scheme| {
                let (enabled, incoming, outgoing) = defaults::transport_flags(scheme);
                let mut transport = Transport::new(scheme);
                transport.enabled = enabled;
                transport.incoming = incoming;
                transport.outgoing = outgoing;
                if let Some(address) = defaults::bind_address(scheme) {
                    transport.add_address(address);
                }
                transport
            })
            .collect();

        Self {
            home,
            name: None,
            peer_id: None,
            description: None,
            log_level: defaults::LOG_LEVEL.to_string(),
            principal: None,
            password: None,
            credentials: None,
            transports,
            rendezvous: defaults::rendezvous(),
            relay: defaults::relay(),
            endpoint_queue_size: defaults::ENDPOINT_QUEUE_SIZE,
            proxy_enabled: false,
            infrastructure: defaults::group(),
            extensions: BTreeMap::new(),
            optimizers: OptimizerChain::new(),
            registry,
            seed_source: Box::new(HttpSeedFetcher::default()),
            pki: Box::new(RcgenPki),
        }
    }

    /// Defaults, then the built-in seed profile as a baseline.
    pub fn new_from_defaults(home: impl Into<PathBuf>) -> Self {
        let mut config = Self::with_defaults(home.into());
        match Profile::builtin(builtin::SEED) {
            Ok(seed) => {
                if let Err(e) = config.apply_profile(&seed, true) {
                    warn!("Seed profile rejected, keeping compile-time defaults: {}", e);
                }
            }
            Err(e) => warn!("Seed profile unavailable, keeping compile-time defaults: {}", e),
        }
        config
    }

    /// Defaults and seed, superseded by the descriptor persisted in `home`.
    ///
    /// A missing or corrupt descriptor leaves the seed values in place.
    pub fn from_home(home: impl Into<PathBuf>) -> Result<Self> {
        let mut config = Self::new_from_defaults(home);
        let path = config.descriptor_path();
        if let Some(descriptor) = descriptor_store::load(&path)
            .wrap_err_with(|| format!("Failed to restore configuration from {:?}", path))?
        {
            config.apply_persisted(&descriptor);
        }
        Ok(config)
    }

    /// Replace every field with the values of a previously resolved descriptor.
    pub fn apply_persisted(&mut self, descriptor: &ConfigurationDescriptor) {
        info!("Restoring persisted configuration of peer '{}'", descriptor.peer.name);

        self.name = Some(descriptor.peer.name.clone());
        self.peer_id = Some(descriptor.peer.id.clone());
        self.description = descriptor.peer.description.clone();
        self.log_level = descriptor.peer.log_level.clone();

        self.password = None;
        match &descriptor.services.membership {
            Some(security) => {
                self.principal = Some(security.principal.clone());
                self.credentials = Some(Credentials {
                    certificate: security.root_certificate.clone(),
                    encrypted_private_key: security.encrypted_private_key.clone(),
                });
            }
            None => {
                self.principal = None;
                self.credentials = None;
            }
        }

        self.transports = descriptor.transports().into_iter().cloned().collect();
        self.rendezvous = descriptor.services.rendezvous.clone();
        self.relay = descriptor.services.relay.clone();
        self.endpoint_queue_size = descriptor.services.endpoint.queue_size;
        self.proxy_enabled = descriptor.services.proxy.enabled;
        self.infrastructure = descriptor.infrastructure.clone();
        self.extensions = descriptor
            .services
            .extensions
            .iter()
            .filter(|(id, _)| {
                let known = is_known_service_id(id);
                if known {
                    warn!("Dropping extension block shadowing service '{}'", id);
                }
                !known
            })
            .map(|(id, params)| (id.clone(), params.clone()))
            .collect();
    }

    /// Run normalize, optimize, validate and build.
    ///
    /// Either every invariant holds and a descriptor is returned, or the
    /// error lists every violation found.
    pub fn resolve(&mut self) -> std::result::Result<ConfigurationDescriptor, ConfigurationError> {
        info!("Normalizing configuration");
        self.normalize();

        info!("Running {} optimizer(s)", self.optimizers.len());
        self.optimize();

        info!("Validating configuration");
        validation::validate(self)?;

        Ok(self.build())
    }

    /// Resolve and persist the descriptor to `path`.
    ///
    /// A validation failure is returned as a [`ConfigurationError`] inside
    /// the report, so callers can downcast it.
    pub fn save(&mut self, path: &Path) -> Result<ConfigurationDescriptor> {
        let descriptor = self.resolve()?;
        descriptor_store::save(path, &descriptor)
            .wrap_err_with(|| format!("Failed to save configuration to {:?}", path))?;
        Ok(descriptor)
    }

    /// [`save`](Self::save) to the descriptor file of the home directory.
    pub fn save_to_home(&mut self) -> Result<ConfigurationDescriptor> {
        let path = self.descriptor_path();
        self.save(&path)
    }

    fn optimize(&mut self) {
        let mut chain = std::mem::take(&mut self.optimizers);
        chain.run(self);
        // keep anything an optimizer registered while running
        chain.append(std::mem::take(&mut self.optimizers));
        self.optimizers = chain;
    }

    fn build(&self) -> ConfigurationDescriptor {
        let http = self.transport(TransportScheme::Http).cloned();
        let http_proxy = http
            .as_ref()
            .and_then(Transport::proxy)
            .filter(|p| p.enabled && self.proxy_enabled)
            .map(|p| p.uri().clone());

        let membership = match (&self.principal, &self.credentials) {
            (Some(principal), Some(credentials)) => Some(SecuritySettings {
                principal: principal.clone(),
                root_certificate: credentials.certificate.clone(),
                encrypted_private_key: credentials.encrypted_private_key.clone(),
            }),
            _ => None,
        };

        ConfigurationDescriptor {
            peer: PeerSettings {
                name: self.name.clone().unwrap_or_else(|| defaults::PEER_NAME.to_string()),
                id: self.peer_id.clone().unwrap_or_default(),
                description: self.description.clone(),
                log_level: self.log_level.clone(),
            },
            infrastructure: self.infrastructure.clone(),
            services: Services {
                tcp: self.transport(TransportScheme::Tcp).cloned(),
                http,
                endpoint: EndpointSettings {
                    queue_size: self.endpoint_queue_size,
                },
                relay: self.relay.clone(),
                rendezvous: self.rendezvous.clone(),
                membership,
                proxy: ProxySettings {
                    enabled: self.proxy_enabled,
                    http_proxy,
                },
                extensions: self.extensions.clone(),
            },
        }
    }

    // Accessors

    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Location of the persisted descriptor inside the home directory.
    pub fn descriptor_path(&self) -> PathBuf {
        descriptor_store::descriptor_path(&self.home)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = Some(name.to_string());
    }

    pub fn peer_id(&self) -> Option<&str> {
        self.peer_id.as_deref()
    }

    pub fn set_peer_id(&mut self, id: &str) {
        self.peer_id = Some(id.to_string());
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: &str) {
        self.description = Some(description.to_string());
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn set_log_level(&mut self, level: &str) {
        self.log_level = level.to_string();
    }

    pub fn principal(&self) -> Option<&str> {
        self.principal.as_deref()
    }

    pub fn set_principal(&mut self, principal: &str) {
        self.principal = Some(principal.to_string());
    }

    pub fn has_password(&self) -> bool {
        self.password.is_some()
    }

    /// Password used once to protect the minted private key.
    pub fn set_password(&mut self, password: &str) {
        self.password = Some(Zeroizing::new(password.to_string()));
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn set_credentials(&mut self, credentials: Option<Credentials>) {
        self.credentials = credentials;
    }

    pub fn transports(&self) -> &[Transport] {
        &self.transports
    }

    pub fn transports_mut(&mut self) -> &mut [Transport] {
        &mut self.transports
    }

    pub fn transport(&self, scheme: TransportScheme) -> Option<&Transport> {
        self.transports.iter().find(|t| t.scheme == scheme)
    }

    pub fn transport_mut(&mut self, scheme: TransportScheme) -> Option<&mut Transport> {
        self.transports.iter_mut().find(|t| t.scheme == scheme)
    }

    /// The transport for `scheme`, created disabled if missing.
    pub fn transport_entry(&mut self, scheme: TransportScheme) -> &mut Transport {
        let index = match self.transports.iter().position(|t| t.scheme == scheme) {
            Some(index) => index,
            None => {
                self.transports.push(Transport::new(scheme));
                self.transports.len() - 1
            }
        };
        &mut self.transports[index]
    }

    /// Install `transport`, replacing any transport of the same scheme.
    pub fn set_transport(&mut self, transport: Transport) {
        let scheme = transport.scheme;
        *self.transport_entry(scheme) = transport;
    }

    pub fn remove_transport(&mut self, scheme: TransportScheme) -> Option<Transport> {
        let index = self.transports.iter().position(|t| t.scheme == scheme)?;
        Some(self.transports.remove(index))
    }

    pub fn rendezvous(&self) -> &RendezvousSettings {
        &self.rendezvous
    }

    pub fn rendezvous_mut(&mut self) -> &mut RendezvousSettings {
        &mut self.rendezvous
    }

    /// Add a rendezvous seed. Returns false if an equal seed is present.
    pub fn add_rendezvous_seed(&mut self, seed: Uri) -> bool {
        add_seed(&mut self.rendezvous.seeds, seed)
    }

    pub fn relay(&self) -> &RelaySettings {
        &self.relay
    }

    pub fn relay_mut(&mut self) -> &mut RelaySettings {
        &mut self.relay
    }

    pub fn add_relay_seed(&mut self, seed: Uri) -> bool {
        add_seed(&mut self.relay.seeds, seed)
    }

    pub fn endpoint_queue_size(&self) -> u32 {
        self.endpoint_queue_size
    }

    pub fn set_endpoint_queue_size(&mut self, size: u32) {
        self.endpoint_queue_size = size;
    }

    pub fn proxy_enabled(&self) -> bool {
        self.proxy_enabled
    }

    pub fn set_proxy_enabled(&mut self, enabled: bool) {
        self.proxy_enabled = enabled;
    }

    pub fn infrastructure(&self) -> &GroupSettings {
        &self.infrastructure
    }

    pub fn infrastructure_mut(&mut self) -> &mut GroupSettings {
        &mut self.infrastructure
    }

    pub fn extensions(&self) -> &BTreeMap<String, serde_yaml::Value> {
        &self.extensions
    }

    /// Parameter block for a service this crate does not interpret.
    ///
    /// Ids of typed services are refused and false is returned, since the
    /// block would be written next to the typed section under the same key.
    pub fn set_extension(&mut self, service_id: &str, params: serde_yaml::Value) -> bool {
        if is_known_service_id(service_id) {
            warn!("Ignoring extension block for typed service '{}'", service_id);
            return false;
        }
        self.extensions.insert(service_id.to_string(), params);
        true
    }

    /// Append an optimizer to the chain run after normalization.
    pub fn add_optimizer(&mut self, optimizer: Box<dyn Optimizer>) {
        debug!("Adding optimizer '{}'", optimizer.name());
        self.optimizers.push(optimizer);
    }

    /// Append the registered optimizer `name`. Returns false if unknown.
    pub fn add_optimizer_by_name(&mut self, name: &str) -> bool {
        match self.registry.create(name) {
            Some(optimizer) => {
                self.add_optimizer(optimizer);
                true
            }
            None => false,
        }
    }

    pub fn optimizer_names(&self) -> Vec<&'static str> {
        self.optimizers.names()
    }

    pub fn registry(&self) -> &Registry<dyn Optimizer> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry<dyn Optimizer> {
        &mut self.registry
    }

    /// Replace the bootstrap collaborator used for sentinel seeds.
    pub fn set_seed_source(&mut self, source: Box<dyn SeedSource>) {
        self.seed_source = source;
    }

    pub fn set_pki(&mut self, pki: Box<dyn Pki>) {
        self.pki = pki;
    }
}

fn add_seed(seeds: &mut Vec<Uri>, seed: Uri) -> bool {
    if seeds.contains(&seed) {
        return false;
    }
    seeds.push(seed);
    true
}

impl fmt::Debug for Configurator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configurator")
            .field("home", &self.home)
            .field("name", &self.name)
            .field("peer_id", &self.peer_id)
            .field("principal", &self.principal)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("has_credentials", &self.credentials.is_some())
            .field("transports", &self.transports)
            .field("rendezvous", &self.rendezvous)
            .field("relay", &self.relay)
            .field("optimizers", &self.optimizers.names())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;

    fn quiet(home: &str) -> Configurator {
        let mut config = Configurator::new_from_defaults(home);
        let tcp = config.transport_entry(TransportScheme::Tcp);
        tcp.clear_addresses();
        tcp.add_address(Address::new("tcp://127.0.0.1:0".parse().unwrap()));
        tcp.set_multicast(None);
        config
    }

    #[test]
    fn test_new_from_defaults_applies_seed() {
        let config = Configurator::new_from_defaults("/tmp/peer");
        let tcp = config.transport(TransportScheme::Tcp).unwrap();
        assert!(tcp.enabled && tcp.incoming && tcp.outgoing);
        assert_eq!(tcp.addresses()[0].port_range, 100);
        assert!(tcp.multicast().is_some());
        assert!(!config.transport(TransportScheme::Http).unwrap().enabled);
        assert_eq!(config.relay().max_clients, 150);
        assert_eq!(config.endpoint_queue_size(), 20);
        assert_eq!(config.descriptor_path(), PathBuf::from("/tmp/peer/platform.yaml"));
    }

    #[test]
    fn test_set_transport_replaces_same_scheme() {
        let mut config = quiet("/tmp/peer");
        let mut replacement = Transport::new(TransportScheme::Tcp);
        replacement.enabled = true;
        config.set_transport(replacement);
        assert_eq!(config.transports().len(), 2);
        assert!(config.transport(TransportScheme::Tcp).unwrap().addresses().is_empty());

        assert!(config.remove_transport(TransportScheme::Http).is_some());
        assert!(config.remove_transport(TransportScheme::Http).is_none());
    }

    #[test]
    fn test_seed_setters_deduplicate() {
        let mut config = quiet("/tmp/peer");
        let seed: Uri = "tcp://192.0.2.1:9701".parse().unwrap();
        assert!(config.add_relay_seed(seed.clone()));
        assert!(!config.add_relay_seed(seed.clone()));
        assert!(config.add_rendezvous_seed(seed));
        assert_eq!(config.relay().seeds.len(), 1);
    }

    #[test]
    fn test_resolve_fills_identity_and_clears_password() {
        let mut config = quiet("/tmp/peer");
        config.set_principal("alice");
        config.set_password("secret");

        let descriptor = config.resolve().unwrap();
        assert!(descriptor.peer.id.starts_with(defaults::PEER_ID_PREFIX));
        assert_eq!(descriptor.peer.name, "alice");
        let membership = descriptor.services.membership.unwrap();
        assert_eq!(membership.principal, "alice");
        assert!(!config.has_password());
        assert!(config.credentials().is_some());
    }

    #[test]
    fn test_http_proxy_is_exported_only_when_enabled() {
        use crate::address::ProxyAddress;

        let mut config = quiet("/tmp/peer");
        config.set_principal("p");
        config.set_password("pw");
        let proxy: Uri = "http://proxy.example:3128".parse().unwrap();
        config
            .transport_entry(TransportScheme::Http)
            .set_proxy(Some(ProxyAddress::new(proxy.clone(), true)));

        assert_eq!(config.resolve().unwrap().services.proxy.http_proxy, None);

        config.set_proxy_enabled(true);
        assert_eq!(config.resolve().unwrap().services.proxy.http_proxy, Some(proxy));
    }

    #[test]
    fn test_apply_persisted_is_a_full_restore() {
        let mut source = quiet("/tmp/a");
        source.set_name("restored");
        source.set_principal("p");
        source.set_password("pw");
        assert!(source.set_extension("urn:ext:x", serde_yaml::Value::from(7)));
        let descriptor = source.resolve().unwrap();

        let mut target = quiet("/tmp/b");
        target.set_name("other");
        target.add_rendezvous_seed("tcp://198.51.100.1:9701".parse().unwrap());
        target.apply_persisted(&descriptor);

        assert_eq!(target.name(), Some("restored"));
        assert_eq!(target.peer_id(), Some(descriptor.peer.id.as_str()));
        assert!(target.rendezvous().seeds.is_empty());
        assert!(target.extensions().contains_key("urn:ext:x"));
        assert_eq!(target.resolve().unwrap(), descriptor);
    }

    #[test]
    fn test_extension_cannot_shadow_typed_service() {
        let mut config = quiet("/tmp/peer");
        assert!(!config.set_extension("relay", serde_yaml::Value::from(1)));
        assert!(config.extensions().is_empty());

        let mut source = quiet("/tmp/a");
        source.set_principal("p");
        source.set_password("pw");
        let mut descriptor = source.resolve().unwrap();
        descriptor
            .services
            .extensions
            .insert("membership".to_string(), serde_yaml::Value::from(1));
        descriptor
            .services
            .extensions
            .insert("urn:ext:y".to_string(), serde_yaml::Value::from(2));
        config.apply_persisted(&descriptor);
        assert_eq!(config.extensions().keys().collect::<Vec<_>>(), vec!["urn:ext:y"]);
    }

    #[test]
    fn test_unknown_optimizer_name() {
        let mut config = quiet("/tmp/peer");
        assert!(config.add_optimizer_by_name("seed-dedup"));
        assert!(!config.add_optimizer_by_name("no-such-optimizer"));
        assert_eq!(config.optimizer_names(), vec!["seed-dedup"]);
    }
}
