//! Seed list cleanup.

use super::Optimizer;
use crate::address::Uri;
use crate::configurator::Configurator;
use crate::registry::Registry;
use crate::utils::validation::{enabled_schemes, is_reachable_seed};
use std::collections::HashSet;

pub const NAME: &str = "seed-dedup";

/// Removes duplicate rendezvous and relay seeds, and seeds whose scheme
/// has no enabled transport to reach them.
#[derive(Debug, Default, Clone, Copy)]
pub struct SeedDedupOptimizer;

impl Optimizer for SeedDedupOptimizer {
    fn name(&self) -> &'static str {
        NAME
    }

    fn optimize(&mut self, config: &mut Configurator) {
        let enabled = enabled_schemes(config.transports());
        let reachable = |seed: &Uri| is_reachable_seed(seed, &enabled);

        let dropped = prune(&mut config.rendezvous_mut().seeds, reachable)
            + prune(&mut config.relay_mut().seeds, reachable);
        if dropped > 0 {
            log::info!("Removed {} duplicate or unreachable seed(s)", dropped);
        }
    }
}

fn prune(seeds: &mut Vec<Uri>, keep: impl Fn(&Uri) -> bool) -> usize {
    let before = seeds.len();
    let mut seen = HashSet::new();
    seeds.retain(|seed| keep(seed) && seen.insert(seed.clone()));
    before - seeds.len()
}

pub fn register(registry: &mut Registry<dyn Optimizer>) {
    registry.register(NAME, || Box::new(SeedDedupOptimizer));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicates_and_unreachable_seeds_are_removed() {
        let mut config = Configurator::new_from_defaults("/tmp/peer");
        {
            let seeds = &mut config.relay_mut().seeds;
            for s in [
                "tcp://192.0.2.1:9701",
                "http://192.0.2.1:9700",
                "tcp://192.0.2.1:9701",
                "192.0.2.3:9701",
            ] {
                seeds.push(s.parse().unwrap());
            }
        }

        SeedDedupOptimizer.optimize(&mut config);

        let left: Vec<String> = config.relay().seeds.iter().map(Uri::to_string).collect();
        assert_eq!(left, vec!["tcp://192.0.2.1:9701"]);
    }
}
