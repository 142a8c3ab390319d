//! Post-normalization hooks.
//!
//! An [`Optimizer`] receives the whole [`Configurator`] after normalization
//! and before validation, and may rewrite any part of it. Optimizers run in
//! the order they were added; there is no isolation between them.
//!
//! Built-in optimizers register themselves through [`register_builtin`], so
//! profiles can name them under `/optimizers/optimizer`.

pub mod nat_relay;
pub mod seed_dedup;

pub use nat_relay::NatRelayOptimizer;
pub use seed_dedup::SeedDedupOptimizer;

use crate::configurator::Configurator;
use crate::registry::Registry;

/// A pluggable configuration rewrite.
pub trait Optimizer {
    /// Registration key, as written in profiles.
    fn name(&self) -> &'static str;

    fn optimize(&mut self, config: &mut Configurator);
}

/// Register every optimizer shipped with this crate.
pub fn register_builtin(registry: &mut Registry<dyn Optimizer>) {
    nat_relay::register(registry);
    seed_dedup::register(registry);
}

/// Ordered list of optimizers.
#[derive(Default)]
pub struct OptimizerChain {
    optimizers: Vec<Box<dyn Optimizer>>,
}

impl OptimizerChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, optimizer: Box<dyn Optimizer>) {
        self.optimizers.push(optimizer);
    }

    /// Move every optimizer of `other` to the end of this chain.
    pub fn append(&mut self, mut other: OptimizerChain) {
        self.optimizers.append(&mut other.optimizers);
    }

    pub fn len(&self) -> usize {
        self.optimizers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.optimizers.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.optimizers.iter().map(|o| o.name()).collect()
    }

    pub fn run(&mut self, config: &mut Configurator) {
        for optimizer in &mut self.optimizers {
            log::debug!("Running optimizer '{}'", optimizer.name());
            optimizer.optimize(config);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Recorder {
        tag: &'static str,
        log: Rc<RefCell<Vec<&'static str>>>,
    }

    impl Optimizer for Recorder {
        fn name(&self) -> &'static str {
            self.tag
        }

        fn optimize(&mut self, config: &mut Configurator) {
            self.log.borrow_mut().push(self.tag);
            config.set_description(self.tag);
        }
    }

    #[test]
    fn test_chain_runs_in_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut chain = OptimizerChain::new();
        for tag in ["first", "second"] {
            chain.push(Box::new(Recorder { tag, log: Rc::clone(&log) }));
        }

        let mut config = Configurator::new_from_defaults("/tmp/peer");
        chain.run(&mut config);

        assert_eq!(*log.borrow(), vec!["first", "second"]);
        assert_eq!(config.description(), Some("second"));
        assert_eq!(chain.names(), vec!["first", "second"]);
    }

    #[test]
    fn test_builtin_registration() {
        let mut registry: Registry<dyn Optimizer> = Registry::new();
        register_builtin(&mut registry);
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["nat-relay", "seed-dedup"]);
    }
}
