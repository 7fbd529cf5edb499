//! Keyword aggregation across providers.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use keyword_primitives::{Arguments, Error, KeywordResult, Result, Value};
use tracing::{debug, info};

use crate::callable::Callable;
use crate::library::Library;
use crate::provider::{InstanceProvider, Provider};

/// A registered keyword: bound callable plus the provider it came from.
#[derive(Clone, Debug)]
pub struct Keyword {
    name: String,
    callable: Callable,
    provider: String,
}

impl Keyword {
    /// Registered keyword name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The bound callable.
    #[must_use]
    pub fn callable(&self) -> &Callable {
        &self.callable
    }

    /// Name of the provider that supplied the keyword.
    #[must_use]
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Tags from the keyword's exposure metadata.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        self.callable.tags()
    }

    /// Invokes the keyword.
    ///
    /// # Errors
    ///
    /// Returns whatever the keyword implementation returns.
    pub fn call(&self, arguments: Arguments) -> KeywordResult<Value> {
        self.callable.call(arguments)
    }
}

/// Registry of keywords gathered from providers and from its owner.
///
/// The mapping is built once in [`HybridCore::new`] and never changes.
pub struct HybridCore<L>
where
    L: Library,
{
    owner: Arc<L>,
    own: InstanceProvider,
    keywords: BTreeMap<String, Keyword>,
}

impl<L> HybridCore<L>
where
    L: Library,
{
    /// Builds the registry for `owner` from `providers`.
    ///
    /// Providers are scanned in order and later ones win name collisions. The
    /// owner is scanned last, so its own keywords override any provider's.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeKind`] or [`Error::LegacyInstance`] when a provider,
    /// or the owner, has an unsupported shape.
    pub fn new<I>(owner: L, providers: I) -> Result<Self>
    where
        I: IntoIterator<Item = Provider>,
    {
        Self::from_shared(Arc::new(owner), providers)
    }

    /// Builds the registry for an already shared owner.
    ///
    /// # Errors
    ///
    /// See [`HybridCore::new`].
    pub fn from_shared<I>(owner: Arc<L>, providers: I) -> Result<Self>
    where
        I: IntoIterator<Item = Provider>,
    {
        let mut keywords = BTreeMap::new();
        for provider in providers {
            find_keywords(&provider, &mut keywords)?;
        }

        let own = InstanceProvider::new(Arc::clone(&owner));
        find_keywords(&Provider::Instance(own.clone()), &mut keywords)?;

        info!(
            owner = own.declared_type_name(),
            keywords = keywords.len(),
            "keyword registry built"
        );

        Ok(Self {
            owner,
            own,
            keywords,
        })
    }

    /// The library instance the registry was built for.
    #[must_use]
    pub fn owner(&self) -> &Arc<L> {
        &self.owner
    }

    /// Registered keyword names, sorted and unique.
    #[must_use]
    pub fn keyword_names(&self) -> Vec<String> {
        self.keywords.keys().cloned().collect()
    }

    /// Iterates over the registered keywords in name order.
    pub fn keywords(&self) -> impl Iterator<Item = &Keyword> {
        self.keywords.values()
    }

    /// Looks up a keyword by name.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<&Keyword> {
        self.keywords.get(name)
    }

    /// Looks up a keyword, failing like a missing attribute.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AttributeNotFound`] naming `name` and the owner type.
    pub fn attribute(&self, name: &str) -> Result<&Keyword> {
        self.resolve(name).ok_or_else(|| Error::AttributeNotFound {
            name: name.to_owned(),
            owner: self.owner_type_name().to_owned(),
        })
    }

    /// Owner member names together with every keyword name, sorted and unique.
    #[must_use]
    pub fn dir(&self) -> Vec<String> {
        let mut names = self.own.member_names();
        names.extend(self.keywords.keys().cloned());
        names.sort();
        names.dedup();
        names
    }

    /// Number of registered keywords.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    /// Returns `true` when no keyword is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    /// Type name of the owner.
    #[must_use]
    pub fn owner_type_name(&self) -> &'static str {
        self.own.declared_type_name()
    }

    pub(crate) fn own(&self) -> &InstanceProvider {
        &self.own
    }
}

impl<L> fmt::Debug for HybridCore<L>
where
    L: Library,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HybridCore")
            .field("owner", &self.owner_type_name())
            .field("keywords", &self.keywords.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn find_keywords(provider: &Provider, keywords: &mut BTreeMap<String, Keyword>) -> Result<()> {
    debug!(provider = provider.name(), "scanning provider for keywords");
    for member in provider.members()? {
        let Some((name, callable)) = member.keyword() else {
            continue;
        };
        let keyword = Keyword {
            name: name.to_owned(),
            callable: callable.clone(),
            provider: provider.name().to_owned(),
        };
        if let Some(previous) = keywords.insert(keyword.name.clone(), keyword) {
            debug!(
                keyword = previous.name(),
                previous = previous.provider(),
                provider = provider.name(),
                "keyword overridden"
            );
        } else {
            debug!(keyword = name, provider = provider.name(), "keyword registered");
        }
    }
    Ok(())
}
