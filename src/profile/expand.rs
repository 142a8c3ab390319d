//! `${name}` macro expansion for profile values.
//!
//! Expansion is a single left-to-right pass over the input. Nested macros
//! expand innermost first (`${a${b}}` looks up `b`, then `a<value of b>`).
//! Substituted values are inserted literally and never rescanned, so the
//! pass always terminates. An unterminated `${` is kept as written.

/// Expand every `${name}` in `text`, resolving names with `lookup`.
///
/// Names `lookup` does not know expand to the empty string.
pub fn expand<F>(text: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    if !text.contains("${") {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    // Byte offsets in `out` where each open `${` starts
    let mut open: Vec<usize> = Vec::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '$' if chars.peek() == Some(&'{') => {
                chars.next();
                open.push(out.len());
                out.push_str("${");
            }
            '}' if !open.is_empty() => {
                let start = open.pop().unwrap_or_default();
                let name = out[start + 2..].to_string();
                out.truncate(start);
                out.push_str(&lookup(name.trim()).unwrap_or_default());
            }
            _ => out.push(c),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn props(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(expand("tcp://:9701", |_| None), "tcp://:9701");
        assert_eq!(expand("cost $5 {x}", |_| None), "cost $5 {x}");
    }

    #[test]
    fn test_simple_and_missing() {
        let p = props(&[("HOST", "10.0.0.1")]);
        let lookup = |k: &str| p.get(k).cloned();
        assert_eq!(expand("tcp://${HOST}:9701", lookup), "tcp://10.0.0.1:9701");
        assert_eq!(expand("tcp://${NOPE}:9701", lookup), "tcp://:9701");
    }

    #[test]
    fn test_nested_expands_innermost_first() {
        let p = props(&[("ENV", "prod"), ("host.prod", "relay.example.org")]);
        let lookup = |k: &str| p.get(k).cloned();
        assert_eq!(expand("${host.${ENV}}", lookup), "relay.example.org");
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let p = props(&[("LOOP", "${LOOP}")]);
        let lookup = |k: &str| p.get(k).cloned();
        assert_eq!(expand("x${LOOP}y", lookup), "x${LOOP}y");
    }

    #[test]
    fn test_unterminated_macro_kept() {
        assert_eq!(expand("a${b", |_| Some("z".into())), "a${b");
        assert_eq!(expand("a}b", |_| Some("z".into())), "a}b");
    }
}
