//! Profile documents compiled into the crate.

/// Baseline applied by every new configuration.
pub const SEED: &str = "seed";

const DOCUMENTS: &[(&str, &str)] = &[
    (SEED, include_str!("../../profiles/seed.yaml")),
    ("edge", include_str!("../../profiles/edge.yaml")),
    ("rendezvous", include_str!("../../profiles/rendezvous.yaml")),
    ("relay", include_str!("../../profiles/relay.yaml")),
];

/// Source text of the built-in profile `name`.
pub fn lookup(name: &str) -> Option<&'static str> {
    DOCUMENTS
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, text)| *text)
}

/// Names of all built-in profiles.
pub fn names() -> impl Iterator<Item = &'static str> {
    DOCUMENTS.iter().map(|(n, _)| *n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::resource::Resource;

    #[test]
    fn test_every_builtin_parses() {
        for name in names() {
            let text = lookup(name).unwrap();
            Resource::parse(name, text).unwrap_or_else(|e| panic!("{}: {}", name, e));
        }
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert!(lookup("EDGE").is_some());
        assert!(lookup("super").is_none());
    }
}
