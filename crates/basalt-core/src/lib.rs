//! Core shared value types for Basalt.
//!
//! This crate is intentionally small: anything that both the Bazel
//! integration and the project model need to agree on lives here.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A canonical Bazel target identifier, e.g. `//server/sync:model` or
/// `@maven//:com_google_guava_guava`.
///
/// Labels compare and hash by value and are used as map keys throughout
/// the resolution pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(String);

impl Label {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this label lives under the given repository prefix
    /// (e.g. `//`, `@//`, `@@//`).
    pub fn has_repository_prefix(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for Label {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Label {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_compare_by_value() {
        let a = Label::new("//a:a");
        let b = Label::from("//a:a".to_string());
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "//a:a");
    }

    #[test]
    fn repository_prefix_check() {
        assert!(Label::new("@//a:a").has_repository_prefix("@//"));
        assert!(!Label::new("//a:a").has_repository_prefix("@//"));
    }
}
