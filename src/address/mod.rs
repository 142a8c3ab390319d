//! Network endpoint model.
//!
//! Value types describing where a peer listens and how it is reached:
//! URIs with optional components, bind/public/proxy/multicast addresses,
//! and the transports that aggregate them.

pub mod uri;
pub mod types;
pub mod transport;

// Re-export commonly used types
pub use uri::{Uri, UriError, HTTP_SCHEME, TCP_SCHEME, UDP_SCHEME};
pub use types::{Address, AddressError, MulticastAddress, ProxyAddress, PublicAddress};
pub use transport::{Transport, TransportScheme};
