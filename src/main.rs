use clap::{Parser, ValueEnum};
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use env_logger::Env;
use log::info;
use peercfg::address::{Address, TransportScheme, Uri};
use peercfg::configurator::Configurator;
use peercfg::descriptor::ConfigurationDescriptor;
use peercfg::profile::Profile;
use peercfg::utils::net_probe;
use std::path::PathBuf;

/// Resolve and persist the bootstrap configuration of an overlay peer
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Peer home directory holding platform.yaml
    #[arg(long, default_value = ".peercfg")]
    home: PathBuf,

    /// Profile to apply: a built-in name (edge, rendezvous, relay), a path or a URL
    #[arg(short, long)]
    profile: Vec<String>,

    /// Peer name
    #[arg(short, long)]
    name: Option<String>,

    /// Principal the identity certificate is issued to
    #[arg(long)]
    principal: Option<String>,

    /// Password protecting the identity private key
    #[arg(long)]
    password: Option<String>,

    /// Base port of every tcp bind address
    #[arg(long)]
    tcp_port: Option<u16>,

    /// Additional rendezvous seed URI
    #[arg(long)]
    rendezvous_seed: Vec<Uri>,

    /// Additional relay seed URI
    #[arg(long)]
    relay_seed: Vec<Uri>,

    /// Registered optimizer to run after normalization
    #[arg(long)]
    optimizer: Vec<String>,

    /// Resolve without writing platform.yaml
    #[arg(long)]
    no_save: bool,

    /// Print the resolved descriptor
    #[arg(long, value_enum)]
    print: Option<OutputFormat>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Yaml,
    Json,
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let args = Args::parse();

    // Initialize logging with default filter level of "info"
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    info!("Peer home directory: {:?}", args.home);
    let mut config = Configurator::from_home(&args.home)?;

    for reference in &args.profile {
        let profile = Profile::open(reference)
            .wrap_err_with(|| format!("Failed to load profile '{}'", reference))?;
        config
            .apply_profile(&profile, false)
            .wrap_err_with(|| format!("Failed to apply profile '{}'", reference))?;
        info!("Applied profile '{}'", reference);
    }

    apply_overrides(&mut config, &args)?;

    let descriptor = if args.no_save {
        config.resolve()?
    } else {
        config.save_to_home()?
    };

    if let Some(format) = args.print {
        println!("{}", render(&descriptor, format)?);
    }

    info!(
        "Configuration of peer '{}' ({}) resolved successfully",
        descriptor.peer.name, descriptor.peer.id
    );
    Ok(())
}

/// Apply command-line values on top of every loaded layer.
fn apply_overrides(config: &mut Configurator, args: &Args) -> Result<()> {
    if let Some(name) = &args.name {
        config.set_name(name);
    }
    if let Some(principal) = &args.principal {
        config.set_principal(principal);
    }
    if let Some(password) = &args.password {
        config.set_password(password);
    }

    if let Some(port) = args.tcp_port {
        let tcp = config.transport_entry(TransportScheme::Tcp);
        if tcp.addresses().is_empty() {
            if let Some(model) = net_probe::model(TransportScheme::Tcp.as_str(), Some(port)) {
                tcp.add_address(Address::new(model));
            }
        }
        for address in tcp.addresses_mut() {
            address.uri = address.uri.clone().with_port(port);
        }
    }

    for seed in &args.rendezvous_seed {
        config.add_rendezvous_seed(seed.clone());
    }
    for seed in &args.relay_seed {
        config.add_relay_seed(seed.clone());
    }

    for name in &args.optimizer {
        if !config.add_optimizer_by_name(name) {
            let known: Vec<&str> = config.registry().names().collect();
            return Err(eyre!(
                "Unknown optimizer '{}' (available: {})",
                name,
                known.join(", ")
            ));
        }
    }
    Ok(())
}

fn render(descriptor: &ConfigurationDescriptor, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Yaml => descriptor.to_yaml().wrap_err("Failed to render descriptor as YAML"),
        OutputFormat::Json => {
            serde_json::to_string_pretty(descriptor).wrap_err("Failed to render descriptor as JSON")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let args = Args::parse_from([
            "peercfg",
            "--home",
            "/tmp/peer",
            "--profile",
            "edge",
            "--relay-seed",
            "tcp://192.0.2.1:9701",
            "--print",
            "json",
        ]);

        assert_eq!(args.home, PathBuf::from("/tmp/peer"));
        assert_eq!(args.profile, vec!["edge".to_string()]);
        assert_eq!(args.relay_seed[0].port(), Some(9701));
        assert_eq!(args.print, Some(OutputFormat::Json));
        assert!(!args.no_save);
    }

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["peercfg"]);
        assert_eq!(args.home, PathBuf::from(".peercfg"));
        assert!(args.profile.is_empty());
        assert_eq!(args.print, None);
    }

    #[test]
    fn test_overrides() {
        let args = Args::parse_from([
            "peercfg",
            "--name",
            "alpha",
            "--tcp-port",
            "9901",
            "--optimizer",
            "seed-dedup",
        ]);
        let mut config = Configurator::new_from_defaults("/tmp/peer");
        apply_overrides(&mut config, &args).unwrap();

        assert_eq!(config.name(), Some("alpha"));
        let tcp = config.transport(TransportScheme::Tcp).unwrap();
        assert!(tcp.addresses().iter().all(|a| a.uri.port() == Some(9901)));
        assert_eq!(config.optimizer_names(), vec!["seed-dedup"]);

        let bad = Args::parse_from(["peercfg", "--optimizer", "missing"]);
        assert!(apply_overrides(&mut config, &bad).is_err());
    }
}
