//! # Named Factory Registry
//!
//! Profiles refer to pluggable components (optimizers) by name. Instead of
//! instantiating a type named at runtime, every component module registers a
//! factory function under a fixed string key, and the registry resolves
//! profile names to those factories.
//!
//! ## Usage
//!
//! ```
//! use peercfg::optimizer::{self, Optimizer};
//! use peercfg::registry::Registry;
//!
//! let mut registry: Registry<dyn Optimizer> = Registry::new();
//! optimizer::register_builtin(&mut registry);
//!
//! assert!(registry.create("seed-dedup").is_some());
//! assert!(registry.create("no-such-optimizer").is_none());
//! ```

use std::collections::BTreeMap;
use std::fmt;

/// Constructor of a registered component.
pub type Factory<T> = fn() -> Box<T>;

/// Map from registration keys to factories.
pub struct Registry<T: ?Sized> {
    entries: BTreeMap<&'static str, Factory<T>>,
}

impl<T: ?Sized> Registry<T> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Register `factory` under `name`, returning any factory it replaced.
    pub fn register(&mut self, name: &'static str, factory: Factory<T>) -> Option<Factory<T>> {
        let previous = self.entries.insert(name, factory);
        if previous.is_some() {
            log::warn!("Registry entry '{}' was registered twice; keeping the latest", name);
        }
        previous
    }

    pub fn get(&self, name: &str) -> Option<Factory<T>> {
        self.entries.get(name).copied()
    }

    pub fn create(&self, name: &str) -> Option<Box<T>> {
        self.get(name).map(|factory| factory())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }
}

impl<T: ?Sized> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> Clone for Registry<T> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter {
        fn greet(&self) -> String;
    }

    struct Hello;
    impl Greeter for Hello {
        fn greet(&self) -> String {
            "hello".to_string()
        }
    }

    struct Hi;
    impl Greeter for Hi {
        fn greet(&self) -> String {
            "hi".to_string()
        }
    }

    #[test]
    fn test_register_and_create() {
        let mut registry: Registry<dyn Greeter> = Registry::new();
        assert!(registry.register("hello", || Box::new(Hello)).is_none());
        assert_eq!(registry.create("hello").unwrap().greet(), "hello");
        assert!(registry.create("hi").is_none());
    }

    #[test]
    fn test_reregistration_replaces() {
        let mut registry: Registry<dyn Greeter> = Registry::new();
        registry.register("greeter", || Box::new(Hello));
        assert!(registry.register("greeter", || Box::new(Hi)).is_some());
        assert_eq!(registry.create("greeter").unwrap().greet(), "hi");
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["greeter"]);
    }
}
