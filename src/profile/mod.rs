//! Layered profile documents with typed, defaulted key-path lookups.
//!
//! A [`Profile`] is an ordered list of loaded [`Resource`] fragments queried
//! together as if they hung under one root: single-valued lookups return the
//! first match in load order, multi-valued lookups return every match.
//!
//! Every string result passes through `${name}` expansion (see [`expand`]).
//! Names resolve against properties set on the profile, then the process
//! environment, then the empty string. A value that expands to the empty
//! string counts as absent, so the caller's default applies.
//!
//! ## Example
//!
//! ```
//! use peercfg::profile::Profile;
//!
//! let profile = Profile::parse("inline", "peer:\n  name: alpha\n  port: 9701\n")?;
//! assert_eq!(profile.get("/peer/@name", "anonymous"), "alpha");
//! assert_eq!(profile.get_int("/peer/@port", 0)?, 9701);
//! assert!(profile.get_bool("/peer/@debug", false).is_ok());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod builtin;
pub mod color;
pub mod expand;
pub mod resource;

pub use color::Color;
pub use resource::Resource;

use crate::address::Uri;
use crate::error::{ConversionError, ProfileError, ResourceNotFoundError};
use crate::registry::{Factory, Registry};
use crate::utils::bootstrap::{fetch_text, FETCH_TIMEOUT};
use crate::utils::duration::parse_duration;
use reqwest::Url;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Ordered set of profile fragments plus macro properties.
#[derive(Debug, Clone, Default)]
pub struct Profile {
    fragments: Vec<Resource>,
    properties: BTreeMap<String, String>,
}

impl Profile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Profile made of the built-in document `name`.
    pub fn builtin(name: &str) -> Result<Self, ProfileError> {
        let mut profile = Self::new();
        profile.load_builtin(name)?;
        Ok(profile)
    }

    /// Profile loaded from a URL, a `file://` URL, or a plain path.
    pub fn from_url(location: &str) -> Result<Self, ProfileError> {
        let mut profile = Self::new();
        profile.load_url(location)?;
        Ok(profile)
    }

    pub fn from_reader<R: Read>(name: &str, reader: R) -> Result<Self, ProfileError> {
        let mut profile = Self::new();
        profile.load_reader(name, reader)?;
        Ok(profile)
    }

    pub fn parse(name: &str, text: &str) -> Result<Self, ProfileError> {
        let mut profile = Self::new();
        profile.fragments.push(Resource::parse(name, text)?);
        Ok(profile)
    }

    /// Resolve a command-line style reference: a built-in name, else a location.
    pub fn open(reference: &str) -> Result<Self, ProfileError> {
        if builtin::lookup(reference).is_some() {
            Self::builtin(reference)
        } else {
            Self::from_url(reference)
        }
    }

    pub fn load_builtin(&mut self, name: &str) -> Result<&mut Self, ProfileError> {
        let text = builtin::lookup(name).ok_or_else(|| ResourceNotFoundError {
            resource: name.to_string(),
            reason: format!(
                "no built-in profile by that name (available: {})",
                builtin::names().collect::<Vec<_>>().join(", ")
            ),
        })?;
        self.fragments.push(Resource::parse(name, text)?);
        Ok(self)
    }

    pub fn load_url(&mut self, location: &str) -> Result<&mut Self, ProfileError> {
        let not_found = |reason: String| ResourceNotFoundError {
            resource: location.to_string(),
            reason,
        };

        let text = if location.starts_with("http://") || location.starts_with("https://") {
            fetch_text(location, FETCH_TIMEOUT).map_err(|e| not_found(e.to_string()))?
        } else {
            let path = location.strip_prefix("file://").unwrap_or(location);
            std::fs::read_to_string(Path::new(path)).map_err(|e| not_found(e.to_string()))?
        };

        log::debug!("Loaded profile fragment from {}", location);
        self.fragments.push(Resource::parse(location, &text)?);
        Ok(self)
    }

    pub fn load_reader<R: Read>(
        &mut self,
        name: &str,
        reader: R,
    ) -> Result<&mut Self, ProfileError> {
        self.fragments.push(Resource::from_reader(name, reader)?);
        Ok(self)
    }

    pub fn fragments(&self) -> &[Resource] {
        &self.fragments
    }

    /// Define a property visible to `${name}` expansion.
    pub fn set_property(&mut self, name: &str, value: &str) {
        self.properties.insert(name.to_string(), value.to_string());
    }

    /// Overwrite the value at `path` in the first fragment.
    ///
    /// Intended for callers preparing a profile before it is applied.
    pub fn set(&mut self, path: &str, value: &str) {
        if self.fragments.is_empty() {
            self.fragments.push(Resource::empty("runtime"));
        }
        self.fragments[0].set(path, value);
    }

    pub fn contains(&self, path: &str) -> bool {
        self.fragments.iter().any(|f| f.contains(path))
    }

    fn expand(&self, raw: &str) -> String {
        expand::expand(raw, |name| {
            self.properties
                .get(name)
                .cloned()
                .or_else(|| std::env::var(name).ok())
        })
    }

    /// First non-empty expanded value at `path`.
    pub fn get_opt(&self, path: &str) -> Option<String> {
        self.fragments
            .iter()
            .flat_map(|f| f.scalars(path))
            .map(|raw| self.expand(&raw))
            .find(|v| !v.trim().is_empty())
            .map(|v| v.trim().to_string())
    }

    pub fn get(&self, path: &str, default: &str) -> String {
        self.get_opt(path).unwrap_or_else(|| default.to_string())
    }

    /// Every non-empty expanded value at `path`, across all fragments.
    pub fn get_all(&self, path: &str) -> Vec<String> {
        self.fragments
            .iter()
            .flat_map(|f| f.scalars(path))
            .map(|raw| self.expand(&raw).trim().to_string())
            .filter(|v| !v.is_empty())
            .collect()
    }

    fn get_parsed<T: FromStr>(
        &self,
        path: &str,
        target: &'static str,
    ) -> Result<Option<T>, ConversionError> {
        match self.get_opt(path) {
            Some(value) => value
                .parse::<T>()
                .map(Some)
                .map_err(|_| ConversionError::new(value, target)),
            None => Ok(None),
        }
    }

    pub fn get_int(&self, path: &str, default: i32) -> Result<i32, ConversionError> {
        Ok(self.get_parsed(path, "int")?.unwrap_or(default))
    }

    pub fn get_long(&self, path: &str, default: i64) -> Result<i64, ConversionError> {
        Ok(self.get_parsed(path, "long")?.unwrap_or(default))
    }

    /// Booleans accept true/false, yes/no, on/off and 1/0, case-insensitively.
    pub fn get_bool(&self, path: &str, default: bool) -> Result<bool, ConversionError> {
        match self.get_opt(path) {
            Some(value) => parse_bool(&value),
            None => Ok(default),
        }
    }

    pub fn get_uri(
        &self,
        path: &str,
        default: Option<Uri>,
    ) -> Result<Option<Uri>, ConversionError> {
        Ok(self.get_parsed(path, "uri")?.or(default))
    }

    pub fn get_url(
        &self,
        path: &str,
        default: Option<Url>,
    ) -> Result<Option<Url>, ConversionError> {
        Ok(self.get_parsed(path, "url")?.or(default))
    }

    pub fn get_color(&self, path: &str, default: Color) -> Result<Color, ConversionError> {
        Ok(self.get_parsed(path, "color")?.unwrap_or(default))
    }

    pub fn get_duration(&self, path: &str, default: Duration) -> Result<Duration, ConversionError> {
        match self.get_opt(path) {
            Some(value) => parse_duration(&value),
            None => Ok(default),
        }
    }

    /// Resolve the component name at `path` against `registry`.
    ///
    /// An absent key yields `Ok(None)`; a name with no registration is a
    /// conversion error.
    pub fn get_class_ref<T: ?Sized>(
        &self,
        path: &str,
        registry: &Registry<T>,
    ) -> Result<Option<Factory<T>>, ConversionError> {
        match self.get_opt(path) {
            Some(name) => registry
                .get(&name)
                .map(Some)
                .ok_or_else(|| ConversionError::new(name, "registered component")),
            None => Ok(None),
        }
    }

    /// Every value at `path` parsed as a URI.
    pub fn get_all_uris(&self, path: &str) -> Result<Vec<Uri>, ConversionError> {
        self.get_all(path)
            .into_iter()
            .map(|v| v.parse::<Uri>().map_err(|_| ConversionError::new(v, "uri")))
            .collect()
    }
}

/// Lenient boolean parsing shared by profile accessors.
pub fn parse_bool(value: &str) -> Result<bool, ConversionError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConversionError::new(value, "bool")),
    }
}
