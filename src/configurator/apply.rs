//! Applying profile layers to a [`Configurator`].
//!
//! ## Merge modes
//!
//! - `overlay = true` treats the profile as a baseline: every key it omits
//!   is reset to its compile-time default.
//! - `overlay = false` treats it as an increment: omitted keys keep their
//!   current value, present keys replace it.
//!
//! Collection-valued keys (seed lists, bind and public address lists, the
//! optimizer list, proxy and multicast blocks) are cleared and replaced as
//! a whole when the profile declares that key, or always for a baseline.
//!
//! ## Recognized keys
//!
//! | Path | Meaning |
//! |---|---|
//! | `/peer/@name`, `@id`, `@description`, `@log_level` | peer identity |
//! | `/security/@principal`, `@password` | certificate minting inputs |
//! | `/transports/<tcp\|http>/@enabled`, `@incoming`, `@outgoing`, `@port_range` | transport flags |
//! | `/transports/<scheme>/address` | bind addresses (multi) |
//! | `/transports/<scheme>/public_address`, `@public_exclusive` | public addresses (multi) |
//! | `/transports/<scheme>/proxy/@uri`, `@enabled` | outbound proxy |
//! | `/transports/<scheme>/multicast/@uri`, `@enabled`, `@size` | discovery group |
//! | `/rendezvous/@enabled`, `@auto_start`, `@bootstrap`, `@discovery`, `seed` | rendezvous |
//! | `/relay/@incoming`, `@outgoing`, `@max_clients`, `@max_relays`, `@client_lease`, `@relay_lease`, `@queue_size`, `@bootstrap`, `@discovery`, `seed` | relay |
//! | `/endpoint/@queue_size` | endpoint queue |
//! | `/proxy/@enabled` | proxy service |
//! | `/group/@id`, `@name`, `@description` | infrastructure group |
//! | `/optimizers/optimizer` | registered optimizer names (multi) |

use super::{defaults, Configurator};
use crate::address::{
    Address, MulticastAddress, ProxyAddress, PublicAddress, Transport, TransportScheme, Uri,
};
use crate::error::ConversionError;
use crate::optimizer::OptimizerChain;
use crate::profile::Profile;
use log::debug;
use std::time::Duration;
use zeroize::Zeroizing;

/// A profile together with the merge mode it is applied in.
struct Layer<'a> {
    profile: &'a Profile,
    overlay: bool,
}

impl Layer<'_> {
    /// Whether a scalar at `path` gets assigned by this layer.
    fn assigns(&self, path: &str) -> bool {
        self.overlay || self.profile.get_opt(path).is_some()
    }

    /// Whether a collection at `path` gets replaced by this layer.
    fn replaces(&self, path: &str) -> bool {
        self.overlay || self.profile.contains(path)
    }

    fn text(&self, path: &str, default: Option<&str>) -> Option<Option<String>> {
        if !self.assigns(path) {
            return None;
        }
        Some(
            self.profile
                .get_opt(path)
                .or_else(|| default.map(str::to_string)),
        )
    }

    fn flag(&self, path: &str, default: bool) -> Result<Option<bool>, ConversionError> {
        if !self.assigns(path) {
            return Ok(None);
        }
        self.profile.get_bool(path, default).map(Some)
    }

    fn count<T>(
        &self,
        path: &str,
        default: T,
        target: &'static str,
    ) -> Result<Option<T>, ConversionError>
    where
        T: TryFrom<i64> + Into<i64>,
    {
        if !self.assigns(path) {
            return Ok(None);
        }
        read_count(self.profile, path, default, target).map(Some)
    }

    fn duration(&self, path: &str, default: Duration) -> Result<Option<Duration>, ConversionError> {
        if !self.assigns(path) {
            return Ok(None);
        }
        self.profile.get_duration(path, default).map(Some)
    }

    fn uri(&self, path: &str) -> Result<Option<Option<Uri>>, ConversionError> {
        if !self.assigns(path) {
            return Ok(None);
        }
        self.profile.get_uri(path, None).map(Some)
    }

    /// Replacement seed list, without value duplicates.
    fn seeds(&self, path: &str) -> Result<Option<Vec<Uri>>, ConversionError> {
        if !self.replaces(path) {
            return Ok(None);
        }
        let mut seeds: Vec<Uri> = Vec::new();
        for seed in self.profile.get_all_uris(path)? {
            if !seeds.contains(&seed) {
                seeds.push(seed);
            }
        }
        Ok(Some(seeds))
    }
}

fn read_count<T>(
    profile: &Profile,
    path: &str,
    default: T,
    target: &'static str,
) -> Result<T, ConversionError>
where
    T: TryFrom<i64> + Into<i64>,
{
    let raw = profile.get_long(path, default.into())?;
    T::try_from(raw).map_err(|_| ConversionError::new(raw.to_string(), target))
}

impl Configurator {
    /// Merge `profile` into the current state.
    ///
    /// Conversion errors abort the application immediately; keys applied
    /// before the failing one keep their new values.
    pub fn apply_profile(
        &mut self,
        profile: &Profile,
        overlay: bool,
    ) -> Result<(), ConversionError> {
        debug!(
            "Applying profile [{}] (overlay: {})",
            profile
                .fragments()
                .iter()
                .map(|f| f.name())
                .collect::<Vec<_>>()
                .join(", "),
            overlay
        );
        let layer = Layer { profile, overlay };

        self.apply_peer(&layer)?;
        for scheme in TransportScheme::ALL {
            self.apply_transport(&layer, scheme)?;
        }
        self.apply_rendezvous(&layer)?;
        self.apply_relay(&layer)?;
        self.apply_services(&layer)?;
        self.apply_optimizers(&layer)?;
        Ok(())
    }

    fn apply_peer(&mut self, layer: &Layer<'_>) -> Result<(), ConversionError> {
        if let Some(name) = layer.text("/peer/@name", None) {
            self.name = name;
        }
        if let Some(id) = layer.text("/peer/@id", None) {
            self.peer_id = id;
        }
        if let Some(description) = layer.text("/peer/@description", None) {
            self.description = description;
        }
        if let Some(Some(level)) = layer.text("/peer/@log_level", Some(defaults::LOG_LEVEL)) {
            self.log_level = level;
        }

        if let Some(principal) = layer.text("/security/@principal", None) {
            self.principal = principal;
        }
        if let Some(password) = layer.text("/security/@password", None) {
            self.password = password.map(Zeroizing::new);
        }
        if layer.overlay {
            self.credentials = None;
        }
        Ok(())
    }

    fn apply_transport(
        &mut self,
        layer: &Layer<'_>,
        scheme: TransportScheme,
    ) -> Result<(), ConversionError> {
        let base = format!("/transports/{}", scheme);
        let path = |key: &str| format!("{}/{}", base, key);

        if !layer.overlay && !layer.profile.contains(&base) {
            return Ok(());
        }

        let transport = if layer.overlay {
            self.set_transport(Transport::new(scheme));
            self.transport_entry(scheme)
        } else {
            self.transport_entry(scheme)
        };

        let (enabled, incoming, outgoing) = defaults::transport_flags(scheme);
        if let Some(v) = layer.flag(&path("@enabled"), enabled)? {
            transport.enabled = v;
        }
        if let Some(v) = layer.flag(&path("@incoming"), incoming)? {
            transport.incoming = v;
        }
        if let Some(v) = layer.flag(&path("@outgoing"), outgoing)? {
            transport.outgoing = v;
        }

        if layer.replaces(&path("address")) {
            transport.clear_addresses();
            let uris = layer.profile.get_all_uris(&path("address"))?;
            if uris.is_empty() && !layer.profile.contains(&path("address")) {
                if let Some(address) = defaults::bind_address(scheme) {
                    transport.add_address(address);
                }
            }
            for uri in uris {
                transport.add_address(Address::with_port_range(uri, defaults::PORT_RANGE));
            }
        }
        if let Some(range) =
            layer.count(&path("@port_range"), defaults::PORT_RANGE, "port range")?
        {
            for address in transport.addresses_mut() {
                address.port_range = range;
            }
        }

        if layer.replaces(&path("public_address")) {
            let exclusive = layer.profile.get_bool(&path("@public_exclusive"), false)?;
            transport.clear_public_addresses();
            for uri in layer.profile.get_all_uris(&path("public_address"))? {
                transport.add_public_address(PublicAddress::new(uri, exclusive));
            }
        }

        if layer.replaces(&path("proxy")) {
            let enabled = layer.profile.get_bool(&path("proxy/@enabled"), false)?;
            let proxy = layer
                .profile
                .get_uri(&path("proxy/@uri"), None)?
                .map(|uri| ProxyAddress::new(uri, enabled));
            transport.set_proxy(proxy);
        }

        if layer.replaces(&path("multicast")) {
            let declared = layer.profile.contains(&path("multicast"));
            let multicast = if declared || scheme == TransportScheme::Tcp {
                read_multicast(layer.profile, &path("multicast"))?
            } else {
                None
            };
            transport.set_multicast(multicast);
        }

        Ok(())
    }

    fn apply_rendezvous(&mut self, layer: &Layer<'_>) -> Result<(), ConversionError> {
        let hard = defaults::rendezvous();
        let rdv = &mut self.rendezvous;

        if let Some(v) = layer.flag("/rendezvous/@enabled", hard.enabled)? {
            rdv.enabled = v;
        }
        if let Some(v) = layer.duration("/rendezvous/@auto_start", hard.auto_start)? {
            rdv.auto_start = v;
        }
        if let Some(v) = layer.flag("/rendezvous/@discovery", hard.discovery)? {
            rdv.discovery = v;
        }
        if let Some(v) = layer.uri("/rendezvous/@bootstrap")? {
            rdv.bootstrap = v;
        }
        if let Some(seeds) = layer.seeds("/rendezvous/seed")? {
            rdv.seeds = seeds;
        }
        Ok(())
    }

    fn apply_relay(&mut self, layer: &Layer<'_>) -> Result<(), ConversionError> {
        let hard = defaults::relay();
        let relay = &mut self.relay;

        if let Some(v) = layer.flag("/relay/@incoming", hard.incoming)? {
            relay.incoming = v;
        }
        if let Some(v) = layer.flag("/relay/@outgoing", hard.outgoing)? {
            relay.outgoing = v;
        }
        if let Some(v) =
            layer.count("/relay/@max_clients", hard.max_clients, "relay client count")?
        {
            relay.max_clients = v;
        }
        if let Some(v) = layer.count("/relay/@max_relays", hard.max_relays, "relay count")? {
            relay.max_relays = v;
        }
        if let Some(v) = layer.duration("/relay/@client_lease", hard.client_lease)? {
            relay.client_lease = v;
        }
        if let Some(v) = layer.duration("/relay/@relay_lease", hard.relay_lease)? {
            relay.relay_lease = v;
        }
        if let Some(v) = layer.count("/relay/@queue_size", hard.queue_size, "queue size")? {
            relay.queue_size = v;
        }
        if let Some(v) = layer.flag("/relay/@discovery", hard.discovery)? {
            relay.discovery = v;
        }
        if let Some(v) = layer.uri("/relay/@bootstrap")? {
            relay.bootstrap = v;
        }
        if let Some(seeds) = layer.seeds("/relay/seed")? {
            relay.seeds = seeds;
        }
        Ok(())
    }

    fn apply_services(&mut self, layer: &Layer<'_>) -> Result<(), ConversionError> {
        if let Some(v) =
            layer.count("/endpoint/@queue_size", defaults::ENDPOINT_QUEUE_SIZE, "queue size")?
        {
            self.endpoint_queue_size = v;
        }
        if let Some(v) = layer.flag("/proxy/@enabled", false)? {
            self.proxy_enabled = v;
        }

        let group = &mut self.infrastructure;
        if let Some(Some(id)) = layer.text("/group/@id", Some(defaults::GROUP_ID)) {
            group.id = id;
        }
        if let Some(Some(name)) = layer.text("/group/@name", Some(defaults::GROUP_NAME)) {
            group.name = name;
        }
        if let Some(Some(description)) =
            layer.text("/group/@description", Some(defaults::GROUP_DESCRIPTION))
        {
            group.description = description;
        }
        Ok(())
    }

    fn apply_optimizers(&mut self, layer: &Layer<'_>) -> Result<(), ConversionError> {
        const PATH: &str = "/optimizers/optimizer";
        if !layer.replaces(PATH) {
            return Ok(());
        }

        let mut chain = OptimizerChain::new();
        for name in layer.profile.get_all(PATH) {
            let factory = self
                .registry
                .get(&name)
                .ok_or_else(|| ConversionError::new(name.as_str(), "registered optimizer"))?;
            chain.push(factory());
        }
        self.optimizers = chain;
        Ok(())
    }
}

/// Multicast block at `base`, falling back to the default discovery group.
fn read_multicast(
    profile: &Profile,
    base: &str,
) -> Result<Option<MulticastAddress>, ConversionError> {
    let path = |key: &str| format!("{}/{}", base, key);

    let Some(uri) = profile.get_uri(&path("@uri"), defaults::multicast_uri())? else {
        return Ok(None);
    };
    let enabled = profile.get_bool(&path("@enabled"), true)?;
    let size = read_count(profile, &path("@size"), defaults::MULTICAST_SIZE, "multicast size")?;

    let text = uri.to_string();
    MulticastAddress::new(uri, enabled, size)
        .map(Some)
        .map_err(|_| ConversionError::new(text, "udp multicast uri"))
}
