//! # peercfg - Bootstrap configuration resolver for overlay peers
//!
//! This library resolves the startup configuration of a peer in a P2P
//! overlay network. Layered sources (compile-time defaults, the built-in
//! seed profile, a persisted descriptor, profile documents and programmatic
//! setters) are merged into one validated, network-ready
//! [`ConfigurationDescriptor`](descriptor::ConfigurationDescriptor).
//!
//! ## Pipeline
//!
//! ```text
//! defaults -> seed profile -> persisted descriptor -> profiles -> setters
//!          -> normalize -> optimize -> validate -> build -> (save)
//! ```
//!
//! Normalization fills partially specified addresses, probes for free bind
//! ports, replaces sentinel seeds with addresses fetched from a bootstrap
//! service and mints a self-signed identity certificate. Validation collects
//! every violated invariant into a single error.
//!
//! ## Architecture
//!
//! - `configurator`: the mutable configuration state and the pipeline
//! - `profile`: layered YAML profile documents with typed key-path lookups
//! - `address`: URIs, addresses and transports
//! - `optimizer`: post-normalization hooks and the built-in optimizers
//! - `registry`: name to factory registry for optimizers named in profiles
//! - `descriptor`, `descriptor_store`: the resolved output and its persistence
//! - `pki`: identity certificate minting
//! - `utils`: port probing, bootstrap fetching, validation and helpers
//! - `error`: error types
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use peercfg::configurator::Configurator;
//! use peercfg::profile::Profile;
//!
//! let mut config = Configurator::from_home("/var/lib/peer")?;
//! config.apply_profile(&Profile::builtin("edge")?, false)?;
//! config.set_principal("alice");
//! config.set_password("correct horse");
//!
//! // Resolve and write platform.yaml into the home directory
//! let descriptor = config.save_to_home()?;
//! println!("peer id: {}", descriptor.peer.id);
//! # Ok::<(), color_eyre::Report>(())
//! ```
//!
//! ## Error Handling
//!
//! Library components return typed `thiserror` errors. Entry points doing
//! file I/O return `color_eyre::Result` with context attached; a failed
//! validation stays downcastable to
//! [`ConfigurationError`](error::ConfigurationError).

pub mod address;
pub mod configurator;
pub mod descriptor;
pub mod descriptor_store;
pub mod error;
pub mod optimizer;
pub mod pki;
pub mod profile;
pub mod registry;
pub mod utils;

pub use configurator::Configurator;
pub use descriptor::ConfigurationDescriptor;
pub use error::{ConfigurationError, ConversionError};
pub use profile::Profile;
