//! Persisting resolved descriptors in the peer home directory.

use crate::descriptor::ConfigurationDescriptor;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::{info, warn};
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// File name of the descriptor inside a home directory.
pub const DESCRIPTOR_FILE: &str = "platform.yaml";

pub fn descriptor_path(home: &Path) -> PathBuf {
    home.join(DESCRIPTOR_FILE)
}

/// Load a persisted descriptor from a YAML file
///
/// Returns `Ok(None)` when there is nothing usable to restore: the file is
/// missing, or it did not parse and was deleted. Failing to delete a
/// corrupt file is an error, since it would be found corrupt again on
/// every start.
pub fn load(path: &Path) -> Result<Option<ConfigurationDescriptor>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!("No persisted configuration at {:?}", path);
            return Ok(None);
        }
        Err(e) => return Err(e).wrap_err_with(|| format!("Failed to read {:?}", path)),
    };

    match ConfigurationDescriptor::from_yaml(&content) {
        Ok(descriptor) => {
            info!("Loaded persisted configuration from: {:?}", path);
            Ok(Some(descriptor))
        }
        Err(e) => {
            warn!("Persisted configuration {:?} is corrupt ({}), deleting it", path, e);
            fs::remove_file(path)
                .wrap_err_with(|| format!("Failed to delete corrupt configuration {:?}", path))?;
            Ok(None)
        }
    }
}

/// Write `descriptor` to `path` as YAML, creating parent directories.
///
/// The descriptor is serialized before the file is touched, so a
/// serialization failure leaves any existing file in place.
pub fn save(path: &Path, descriptor: &ConfigurationDescriptor) -> Result<()> {
    let yaml = descriptor
        .to_yaml()
        .wrap_err("Failed to serialize configuration descriptor")?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .wrap_err_with(|| format!("Failed to create directory {:?}", parent))?;
    }

    let mut file = File::create(path).wrap_err_with(|| format!("Failed to create {:?}", path))?;
    file.write_all(yaml.as_bytes())
        .wrap_err_with(|| format!("Failed to write {:?}", path))?;

    info!("Saved configuration to: {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const DESCRIPTOR: &str = r#"
peer:
  name: stored
  id: urn:peer:01
  log_level: debug
infrastructure:
  id: urn:group:net
  name: NetGroup
services:
  endpoint:
    queue_size: 20
  relay:
    incoming: false
    outgoing: false
    max_clients: 150
    max_relays: 1
    client_lease: 2h
    relay_lease: 20m
    queue_size: 20
    discovery: true
  rendezvous:
    enabled: true
    auto_start: 30s
    discovery: false
  proxy:
    enabled: false
"#;

    #[test]
    fn test_missing_file_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(load(&descriptor_path(dir.path())).unwrap().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(DESCRIPTOR_FILE);
        let descriptor = ConfigurationDescriptor::from_yaml(DESCRIPTOR).unwrap();

        save(&path, &descriptor).unwrap();
        assert_eq!(load(&path).unwrap(), Some(descriptor));
    }

    #[test]
    fn test_corrupt_file_is_deleted() {
        let dir = TempDir::new().unwrap();
        let path = descriptor_path(dir.path());
        fs::write(&path, "peer: [this is not: a descriptor").unwrap();

        assert!(load(&path).unwrap().is_none());
        assert!(!path.exists());
    }
}
