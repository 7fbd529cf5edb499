//! Exposure metadata marking a callable as a keyword.

use serde::{Deserialize, Serialize};

/// Marks a callable as a keyword and optionally renames and tags it.
///
/// Callables without exposure metadata are invisible to keyword discovery.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExposureMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tags: Vec<String>,
}

impl ExposureMetadata {
    /// Creates metadata exposing the callable under its own name, untagged.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates metadata exposing the callable under `name`.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::new().with_name(name)
    }

    /// Overrides the exposed keyword name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Replaces the tag list, preserving order.
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Returns the explicit name override, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the tags in registration order.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Returns the keyword name, falling back to `member` when no override
    /// was given or the override is empty.
    #[must_use]
    pub fn exposed_name<'a>(&'a self, member: &'a str) -> &'a str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => member,
        }
    }
}
