//! Keyword registry over a library's own members only.

use std::sync::Arc;

use keyword_primitives::Result;

use crate::library::Library;
use crate::registry::{HybridCore, Keyword};

/// Registry whose only provider is the library itself.
#[derive(Debug)]
pub struct StaticCore<L = ()>
where
    L: Library,
{
    core: HybridCore<L>,
}

impl<L> StaticCore<L>
where
    L: Library,
{
    /// Discovers the keywords `owner` declares.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LegacyInstance`](keyword_primitives::Error::LegacyInstance)
    /// when `owner` reports a type other than `L`.
    pub fn new(owner: L) -> Result<Self> {
        Ok(Self {
            core: HybridCore::new(owner, Vec::new())?,
        })
    }

    /// The underlying registry.
    #[must_use]
    pub fn core(&self) -> &HybridCore<L> {
        &self.core
    }

    /// The library instance.
    #[must_use]
    pub fn owner(&self) -> &Arc<L> {
        self.core.owner()
    }

    /// Sorted keyword names.
    #[must_use]
    pub fn keyword_names(&self) -> Vec<String> {
        self.core.keyword_names()
    }

    /// Looks up a keyword by name.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<&Keyword> {
        self.core.resolve(name)
    }

    /// Looks up a keyword, failing like a missing attribute.
    ///
    /// # Errors
    ///
    /// See [`HybridCore::attribute`].
    pub fn attribute(&self, name: &str) -> Result<&Keyword> {
        self.core.attribute(name)
    }

    /// Owner member names together with every keyword name.
    #[must_use]
    pub fn dir(&self) -> Vec<String> {
        self.core.dir()
    }
}
