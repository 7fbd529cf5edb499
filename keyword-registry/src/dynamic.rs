//! Dynamic dispatch and introspection for host engines.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use keyword_primitives::{Arguments, Map, Result, Value};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::CoreConfig;
use crate::library::Library;
use crate::provider::Provider;
use crate::registry::{HybridCore, Keyword};

/// Pseudo-name addressing the library-level documentation.
pub const INTRO: &str = "__intro__";

/// Pseudo-name addressing the initializer.
pub const INIT: &str = "__init__";

/// The entry points a host engine uses to drive a keyword library.
///
/// Only plain strings, sequences and mappings cross this boundary.
pub trait KeywordLibrary: Send + Sync {
    /// Sorted keyword names.
    fn keyword_names(&self) -> Vec<String>;

    /// Invokes a keyword.
    ///
    /// # Errors
    ///
    /// Fails when the keyword is unknown or when the keyword itself fails.
    fn run_keyword(&self, name: &str, args: Vec<Value>, kwargs: Map<String, Value>)
    -> Result<Value>;

    /// Argument descriptors of a keyword, or of the initializer for
    /// [`INIT`].
    ///
    /// # Errors
    ///
    /// Fails when the keyword is unknown.
    fn keyword_arguments(&self, name: &str) -> Result<Vec<String>>;

    /// Tags of a keyword.
    ///
    /// # Errors
    ///
    /// Fails when the keyword is unknown.
    fn keyword_tags(&self, name: &str) -> Result<Vec<String>>;

    /// Documentation of a keyword, or of the library for [`INTRO`] and
    /// [`INIT`].
    ///
    /// # Errors
    ///
    /// Fails when the keyword is unknown.
    fn keyword_documentation(&self, name: &str) -> Result<String>;
}

/// Summary of one keyword as a host would see it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordInfo {
    /// Keyword name.
    pub name: String,
    /// Argument descriptors.
    pub arguments: Vec<String>,
    /// Tags in registration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Documentation as returned to the host.
    #[serde(default)]
    pub documentation: String,
    /// Provider that supplied the keyword.
    pub provider: String,
}

/// Keyword registry answering host introspection queries and dispatching
/// calls.
pub struct DynamicCore<L = ()>
where
    L: Library,
{
    core: HybridCore<L>,
    tags_supported: AtomicBool,
}

impl<L> DynamicCore<L>
where
    L: Library,
{
    /// Builds a core for `owner` from `providers` with the default
    /// configuration.
    ///
    /// # Errors
    ///
    /// See [`HybridCore::new`].
    pub fn new<I>(owner: L, providers: I) -> Result<Self>
    where
        I: IntoIterator<Item = Provider>,
    {
        Self::with_config(owner, providers, CoreConfig::default())
    }

    /// Builds a core with an explicit configuration.
    ///
    /// # Errors
    ///
    /// See [`HybridCore::new`].
    pub fn with_config<I>(owner: L, providers: I, config: CoreConfig) -> Result<Self>
    where
        I: IntoIterator<Item = Provider>,
    {
        Ok(Self::from_core(HybridCore::new(owner, providers)?, config))
    }

    /// Wraps an already built registry.
    #[must_use]
    pub fn from_core(core: HybridCore<L>, config: CoreConfig) -> Self {
        Self {
            core,
            tags_supported: AtomicBool::new(config.tags_supported()),
        }
    }

    /// The underlying registry.
    #[must_use]
    pub fn core(&self) -> &HybridCore<L> {
        &self.core
    }

    /// The library instance the core was built for.
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

    /// Owner member names together with every keyword name.
    #[must_use]
    pub fn dir(&self) -> Vec<String> {
        self.core.dir()
    }

    /// Invokes `name` with the host-supplied arguments.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AttributeNotFound`](keyword_primitives::Error::AttributeNotFound)
    /// for an unknown keyword. A failure of the keyword itself is returned as
    /// [`Error::Keyword`](keyword_primitives::Error::Keyword) holding the
    /// keyword's own error.
    pub fn run_keyword(
        &self,
        name: &str,
        args: Vec<Value>,
        kwargs: Map<String, Value>,
    ) -> Result<Value> {
        let keyword = self.core.attribute(name)?;
        trace!(keyword = name, positional = args.len(), named = kwargs.len(), "running keyword");
        Ok(keyword.call(Arguments::new(args, kwargs))?)
    }

    /// Argument descriptors of `name`, or of the initializer for [`INIT`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::AttributeNotFound`](keyword_primitives::Error::AttributeNotFound)
    /// for an unknown keyword.
    pub fn keyword_arguments(&self, name: &str) -> Result<Vec<String>> {
        if name == INIT {
            return Ok(self.core.own().init().spec().descriptors(false));
        }
        let callable = self.core.attribute(name)?.callable();
        Ok(callable.spec().descriptors(callable.is_bound()))
    }

    /// Tags of `name`.
    ///
    /// The first call marks the host as querying tags separately; from then on
    /// documentation no longer lists them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AttributeNotFound`](keyword_primitives::Error::AttributeNotFound)
    /// for an unknown keyword.
    pub fn keyword_tags(&self, name: &str) -> Result<Vec<String>> {
        if !self.tags_supported.swap(true, Ordering::AcqRel) {
            debug!(
                owner = self.core.owner_type_name(),
                "host queries keyword tags separately"
            );
        }
        Ok(self.core.attribute(name)?.tags().to_vec())
    }

    /// Documentation of `name`; [`INTRO`] and [`INIT`] address the library
    /// and its initializer.
    ///
    /// Until [`DynamicCore::keyword_tags`] has been called, a keyword's tags
    /// are appended as a `Tags: a, b` line.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AttributeNotFound`](keyword_primitives::Error::AttributeNotFound)
    /// for an unknown keyword.
    pub fn keyword_documentation(&self, name: &str) -> Result<String> {
        match name {
            INTRO => Ok(self.core.own().doc().to_owned()),
            INIT => Ok(self.core.own().init().doc().to_owned()),
            _ => {
                let keyword = self.core.attribute(name)?;
                Ok(self.compose_documentation(keyword))
            }
        }
    }

    /// Returns `true` once tags have been queried through
    /// [`DynamicCore::keyword_tags`] or the configuration declared support.
    #[must_use]
    pub fn tags_supported(&self) -> bool {
        self.tags_supported.load(Ordering::Acquire)
    }

    /// Summarises every keyword without touching the tag-support flag.
    #[must_use]
    pub fn describe(&self) -> Vec<KeywordInfo> {
        self.core
            .keywords()
            .map(|keyword| {
                let callable = keyword.callable();
                KeywordInfo {
                    name: keyword.name().to_owned(),
                    arguments: callable.spec().descriptors(callable.is_bound()),
                    tags: keyword.tags().to_vec(),
                    documentation: self.compose_documentation(keyword),
                    provider: keyword.provider().to_owned(),
                }
            })
            .collect()
    }

    fn compose_documentation(&self, keyword: &Keyword) -> String {
        let doc = keyword.callable().doc();
        let tags = keyword.tags();
        if tags.is_empty() || self.tags_supported() {
            return doc.to_owned();
        }
        let tags = format!("Tags: {}", tags.join(", "));
        if doc.is_empty() {
            tags
        } else {
            format!("{doc}\n\n{tags}")
        }
    }
}

impl<L> KeywordLibrary for DynamicCore<L>
where
    L: Library,
{
    fn keyword_names(&self) -> Vec<String> {
        DynamicCore::keyword_names(self)
    }

    fn run_keyword(
        &self,
        name: &str,
        args: Vec<Value>,
        kwargs: Map<String, Value>,
    ) -> Result<Value> {
        DynamicCore::run_keyword(self, name, args, kwargs)
    }

    fn keyword_arguments(&self, name: &str) -> Result<Vec<String>> {
        DynamicCore::keyword_arguments(self, name)
    }

    fn keyword_tags(&self, name: &str) -> Result<Vec<String>> {
        DynamicCore::keyword_tags(self, name)
    }

    fn keyword_documentation(&self, name: &str) -> Result<String> {
        DynamicCore::keyword_documentation(self, name)
    }
}

impl<L> fmt::Debug for DynamicCore<L>
where
    L: Library,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicCore")
            .field("core", &self.core)
            .field("tags_supported", &self.tags_supported())
            .finish()
    }
}
