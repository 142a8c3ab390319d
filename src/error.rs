//! Error types shared across the configuration pipeline.
//!
//! Accessor and resource errors propagate immediately to the caller of the
//! specific operation. Validation problems are collected into a single
//! [`ConfigurationError`] so a failed resolve always reports every problem.

use std::fmt;

/// A typed profile accessor could not coerce a value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot convert '{value}' to {target}")]
pub struct ConversionError {
    /// The original (macro-expanded) string
    pub value: String,
    /// Name of the requested target type
    pub target: &'static str,
}

impl ConversionError {
    pub fn new(value: impl Into<String>, target: &'static str) -> Self {
        Self {
            value: value.into(),
            target,
        }
    }
}

/// A profile resource could not be located or opened.
#[derive(Debug, thiserror::Error)]
#[error("profile resource not found: {resource} ({reason})")]
pub struct ResourceNotFoundError {
    pub resource: String,
    pub reason: String,
}

/// Errors raised while building a profile.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error(transparent)]
    NotFound(#[from] ResourceNotFoundError),

    #[error("malformed profile document '{resource}': {source}")]
    Malformed {
        resource: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error(transparent)]
    Conversion(#[from] ConversionError),
}

/// Category of a single invariant violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    Security,
    Transport,
    Address,
    Multicast,
    Relay,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ViolationKind::Security => "security",
            ViolationKind::Transport => "transport",
            ViolationKind::Address => "address",
            ViolationKind::Multicast => "multicast",
            ViolationKind::Relay => "relay",
        };
        f.write_str(name)
    }
}

/// One violated invariant, with the field it was found on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub kind: ViolationKind,
    pub field: String,
    pub message: String,
}

impl Violation {
    pub fn new(kind: ViolationKind, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.field, self.message)
    }
}

/// Every invariant violation discovered by one validation pass.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub struct ConfigurationError {
    violations: Vec<Violation>,
}

impl ConfigurationError {
    pub fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// True if any violation message or field contains `needle`.
    pub fn mentions(&self, needle: &str) -> bool {
        self.violations
            .iter()
            .any(|v| v.message.contains(needle) || v.field.contains(needle))
    }
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid configuration ({} problem(s))", self.violations.len())?;
        for violation in &self.violations {
            write!(f, "\n  - {}", violation)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_lists_every_violation() {
        let err = ConfigurationError::new(vec![
            Violation::new(ViolationKind::Security, "membership", "no root certificate"),
            Violation::new(ViolationKind::Transport, "tcp", "no addresses"),
        ]);

        let text = err.to_string();
        assert!(text.contains("2 problem(s)"));
        assert!(text.contains("[security] membership: no root certificate"));
        assert!(text.contains("[transport] tcp: no addresses"));
        assert!(err.mentions("root certificate"));
        assert!(!err.mentions("relay"));
    }

    #[test]
    fn test_conversion_error_carries_value_and_target() {
        let err = ConversionError::new("abc", "int");
        assert_eq!(err.value, "abc");
        assert_eq!(err.to_string(), "cannot convert 'abc' to int");
    }
}
