//! Shared utilities: port probing, bootstrap fetching, validation, IP and duration helpers.

pub mod bootstrap;
pub mod duration;
pub mod ip_utils;
pub mod net_probe;
pub mod validation;

pub use bootstrap::{BootstrapError, HttpSeedFetcher, SeedSource};
pub use duration::parse_duration;
pub use net_probe::{find_available_port, is_port_available, validate_address};
pub use validation::validate;
