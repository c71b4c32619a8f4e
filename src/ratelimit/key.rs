//! Composite key for per-caller request history.

use super::class::ActionClass;

/// A key that uniquely identifies one request history.
///
/// The identifier is whatever the caller chose to group traffic by (an IP
/// address, an email). It is stored verbatim; empty strings are valid.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LimiterKey {
    /// Caller-supplied identifier
    pub identifier: String,
    /// Traffic category
    pub class: ActionClass,
}

impl LimiterKey {
    /// Create a new key from an identifier and class.
    pub fn new(identifier: &str, class: ActionClass) -> Self {
        Self {
            identifier: identifier.to_string(),
            class,
        }
    }
}

impl std::fmt::Display for LimiterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.class, self.identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_display() {
        let key = LimiterKey::new("10.0.0.5", ActionClass::Login);
        assert_eq!(key.to_string(), "login:10.0.0.5");
    }

    #[test]
    fn test_keys_differ_by_class() {
        let general = LimiterKey::new("Z", ActionClass::General);
        let login = LimiterKey::new("Z", ActionClass::Login);
        assert_ne!(general, login);
        assert_eq!(general, LimiterKey::new("Z", ActionClass::General));
    }

    #[test]
    fn test_identifier_kept_verbatim() {
        let key = LimiterKey::new("  User@Example.COM ", ActionClass::General);
        assert_eq!(key.identifier, "  User@Example.COM ");

        let empty = LimiterKey::new("", ActionClass::General);
        assert_eq!(empty.identifier, "");
    }
}
