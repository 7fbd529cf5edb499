//! Capability providers and member enumeration.

use std::collections::{BTreeMap, BTreeSet, btree_map};
use std::fmt;
use std::sync::Arc;

use keyword_primitives::{Error, Result, Value};

use crate::callable::{Callable, module_functions};
use crate::library::{Initializer, Library, LibraryType, TypeMember};

/// Value of an enumerated member.
#[derive(Clone, Debug)]
pub enum MemberValue {
    /// A function or bound method.
    Callable(Callable),
    /// A plain attribute value.
    Value(Value),
    /// A computed attribute that was not evaluated.
    Property,
}

/// A `(name, value)` pair yielded by member enumeration.
#[derive(Clone, Debug)]
pub struct Member {
    name: String,
    value: MemberValue,
}

impl Member {
    /// Creates a member.
    #[must_use]
    pub fn new(name: impl Into<String>, value: MemberValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// Creates a member holding `callable` under the callable's own name.
    #[must_use]
    pub fn callable(callable: Callable) -> Self {
        Self::new(callable.name().to_owned(), MemberValue::Callable(callable))
    }

    /// Creates a member holding a plain value.
    #[must_use]
    pub fn plain(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(name, MemberValue::Value(value.into()))
    }

    /// Member name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Member value.
    #[must_use]
    pub fn value(&self) -> &MemberValue {
        &self.value
    }

    /// Returns the keyword name and callable when the member is an exposed
    /// callable.
    #[must_use]
    pub fn keyword(&self) -> Option<(&str, &Callable)> {
        match &self.value {
            MemberValue::Callable(callable) => {
                let metadata = callable.exposure()?;
                Some((metadata.exposed_name(&self.name), callable))
            }
            MemberValue::Value(_) | MemberValue::Property => None,
        }
    }
}

/// A group of top-level functions and values.
#[derive(Clone, Debug)]
pub struct Namespace {
    name: String,
    members: BTreeMap<String, MemberValue>,
}

impl Namespace {
    /// Creates an empty namespace.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: BTreeMap::new(),
        }
    }

    /// Collects every `#[keyword]` function defined in `module`.
    ///
    /// Pass `module_path!()` from inside the module.
    #[must_use]
    pub fn from_module(module: &str) -> Self {
        module_functions(module)
            .into_iter()
            .fold(Self::new(module), Self::function)
    }

    /// Adds a function under its own name.
    #[must_use]
    pub fn function(mut self, callable: Callable) -> Self {
        self.members.insert(
            callable.name().to_owned(),
            MemberValue::Callable(callable),
        );
        self
    }

    /// Adds a plain value.
    #[must_use]
    pub fn constant(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.members
            .insert(name.into(), MemberValue::Value(value.into()));
        self
    }

    /// Namespace name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Looks up a member.
    #[must_use]
    pub fn member(&self, name: &str) -> Option<&MemberValue> {
        self.members.get(name)
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` when the namespace has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

trait ErasedInstance: Send + Sync {
    fn reported_type_name(&self) -> &str;
    fn type_member_names(&self) -> Vec<String>;
    fn type_member(&self, name: &str) -> Option<MemberValue>;
    fn instance_members(&self) -> Vec<Member>;
    fn doc(&self) -> &str;
    fn init(&self) -> &Initializer;
}

struct BoundInstance<T> {
    instance: Arc<T>,
    class: LibraryType<T>,
}

impl<T> ErasedInstance for BoundInstance<T>
where
    T: Library,
{
    fn reported_type_name(&self) -> &str {
        self.instance.reported_type_name()
    }

    fn type_member_names(&self) -> Vec<String> {
        self.class.member_names().map(str::to_owned).collect()
    }

    fn type_member(&self, name: &str) -> Option<MemberValue> {
        Some(match self.class.member(name)? {
            TypeMember::Method(method) => MemberValue::Callable(method.bind(&self.instance)),
            TypeMember::Property(_) => MemberValue::Property,
            TypeMember::Constant(value) => MemberValue::Value(value.clone()),
        })
    }

    fn instance_members(&self) -> Vec<Member> {
        self.instance.instance_members()
    }

    fn doc(&self) -> &str {
        self.class.doc()
    }

    fn init(&self) -> &Initializer {
        self.class.init()
    }
}

/// A library instance together with its type description.
#[derive(Clone)]
pub struct InstanceProvider {
    declared: &'static str,
    inner: Arc<dyn ErasedInstance>,
}

impl InstanceProvider {
    /// Wraps a shared library instance.
    #[must_use]
    pub fn new<T>(instance: Arc<T>) -> Self
    where
        T: Library,
    {
        Self {
            declared: std::any::type_name::<T>(),
            inner: Arc::new(BoundInstance {
                instance,
                class: T::library_type(),
            }),
        }
    }

    /// Type the instance was wrapped as.
    #[must_use]
    pub fn declared_type_name(&self) -> &'static str {
        self.declared
    }

    /// Type the instance reports at runtime.
    #[must_use]
    pub fn reported_type_name(&self) -> &str {
        self.inner.reported_type_name()
    }

    /// Library-level documentation declared on the type.
    #[must_use]
    pub fn doc(&self) -> &str {
        self.inner.doc()
    }

    /// Initializer description declared on the type.
    #[must_use]
    pub fn init(&self) -> &Initializer {
        self.inner.init()
    }

    /// Sorted, de-duplicated names of type and instance members.
    #[must_use]
    pub fn member_names(&self) -> Vec<String> {
        let mut names: BTreeSet<String> = self.inner.type_member_names().into_iter().collect();
        names.extend(
            self.inner
                .instance_members()
                .into_iter()
                .map(|member| member.name),
        );
        names.into_iter().collect()
    }

    fn validate(&self) -> Result<()> {
        let reported = self.reported_type_name();
        if reported == self.declared {
            Ok(())
        } else {
            Err(Error::LegacyInstance {
                declared: self.declared.to_owned(),
                reported: reported.to_owned(),
            })
        }
    }

    fn members(&self) -> Members<'_> {
        let local: BTreeMap<String, MemberValue> = self
            .inner
            .instance_members()
            .into_iter()
            .map(|member| (member.name, member.value))
            .collect();
        let mut names: BTreeSet<String> = self.inner.type_member_names().into_iter().collect();
        names.extend(local.keys().cloned());

        Members {
            inner: MembersInner::Instance {
                provider: self,
                names: names.into_iter(),
                local,
            },
        }
    }
}

impl fmt::Debug for InstanceProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceProvider")
            .field("declared", &self.declared)
            .finish_non_exhaustive()
    }
}

/// A source of keywords.
#[derive(Clone, Debug)]
pub enum Provider {
    /// Group of top-level functions.
    Namespace(Namespace),
    /// Library instance.
    Instance(InstanceProvider),
    /// Bare type descriptor. Always rejected by enumeration.
    Type {
        /// Name of the type.
        type_name: &'static str,
    },
}

impl Provider {
    /// Wraps a namespace.
    #[must_use]
    pub fn namespace(namespace: Namespace) -> Self {
        Self::Namespace(namespace)
    }

    /// Wraps an owned library instance.
    #[must_use]
    pub fn instance<T>(instance: T) -> Self
    where
        T: Library,
    {
        Self::shared(Arc::new(instance))
    }

    /// Wraps a shared library instance.
    #[must_use]
    pub fn shared<T>(instance: Arc<T>) -> Self
    where
        T: Library,
    {
        Self::Instance(InstanceProvider::new(instance))
    }

    /// Refers to the type `T` itself rather than to an instance of it.
    #[must_use]
    pub fn of_type<T>() -> Self
    where
        T: ?Sized,
    {
        Self::Type {
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Name used to identify the provider in logs and keyword records.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Namespace(namespace) => namespace.name(),
            Self::Instance(instance) => instance.declared_type_name(),
            Self::Type { type_name } => type_name,
        }
    }

    /// Enumerates the provider's members, sorted by name.
    ///
    /// Each call starts a fresh enumeration. Instance members are resolved from
    /// the type first, so properties are reported without being evaluated.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeKind`] for a bare type and
    /// [`Error::LegacyInstance`] for an instance whose reported type differs
    /// from its declared type.
    pub fn members(&self) -> Result<Members<'_>> {
        match self {
            Self::Namespace(namespace) => Ok(Members {
                inner: MembersInner::Namespace(namespace.members.iter()),
            }),
            Self::Instance(instance) => {
                instance.validate()?;
                Ok(instance.members())
            }
            Self::Type { type_name } => Err(Error::TypeKind {
                type_name: (*type_name).to_owned(),
            }),
        }
    }
}

impl From<Namespace> for Provider {
    fn from(namespace: Namespace) -> Self {
        Self::Namespace(namespace)
    }
}

impl From<InstanceProvider> for Provider {
    fn from(instance: InstanceProvider) -> Self {
        Self::Instance(instance)
    }
}

/// Lazy iterator over a provider's members.
pub struct Members<'a> {
    inner: MembersInner<'a>,
}

enum MembersInner<'a> {
    Namespace(btree_map::Iter<'a, String, MemberValue>),
    Instance {
        provider: &'a InstanceProvider,
        names: std::collections::btree_set::IntoIter<String>,
        local: BTreeMap<String, MemberValue>,
    },
}

impl Iterator for Members<'_> {
    type Item = Member;

    fn next(&mut self) -> Option<Member> {
        match &mut self.inner {
            MembersInner::Namespace(iter) => iter
                .next()
                .map(|(name, value)| Member::new(name.clone(), value.clone())),
            MembersInner::Instance {
                provider,
                names,
                local,
            } => loop {
                let name = names.next()?;
                let value = provider
                    .inner
                    .type_member(&name)
                    .or_else(|| local.remove(&name));
                if let Some(value) = value {
                    return Some(Member { name, value });
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use keyword_primitives::{ArgumentSpec, ExposureMetadata};
    use serde_json::json;

    use super::*;
    use crate::library::Method;

    fn constant(name: &str) -> Callable {
        let value = json!(name);
        Callable::new(name, ArgumentSpec::empty(), move |_| Ok(value.clone()))
    }

    #[derive(Default)]
    struct Session {
        lazy_reads: Arc<AtomicUsize>,
    }

    impl Library for Session {
        fn library_type() -> LibraryType<Self> {
            LibraryType::new()
                .method(
                    Method::new("close", ArgumentSpec::empty(), |_: &Session, _| Ok(Value::Null))
                        .exposed(ExposureMetadata::new()),
                )
                .property("driver", |session: &Session| {
                    session.lazy_reads.fetch_add(1, Ordering::SeqCst);
                    json!("chromedriver")
                })
                .constant("timeout", 5)
        }

        fn instance_members(&self) -> Vec<Member> {
            vec![
                Member::plain("timeout", 30),
                Member::plain("alias", "default"),
                Member::callable(constant("helper").exposed(ExposureMetadata::new())),
            ]
        }
    }

    struct Impostor;

    impl Library for Impostor {
        fn library_type() -> LibraryType<Self> {
            LibraryType::new()
        }

        fn reported_type_name(&self) -> &str {
            "Proxy"
        }
    }

    #[test]
    fn namespace_members_are_sorted() {
        let provider = Provider::namespace(
            Namespace::new("utils")
                .function(constant("zeta"))
                .constant("VERSION", "1.0")
                .function(constant("alpha")),
        );
        let names: Vec<String> = provider
            .members()
            .unwrap()
            .map(|member| member.name().to_owned())
            .collect();
        assert_eq!(names, ["VERSION", "alpha", "zeta"]);
    }

    #[test]
    fn namespace_lookup_by_member_name() {
        let empty = Namespace::new("empty");
        assert!(empty.is_empty());

        let namespace = empty.function(constant("alpha")).constant("VERSION", "1.0");
        assert_eq!(namespace.len(), 2);
        assert!(matches!(namespace.member("alpha"), Some(MemberValue::Callable(_))));
        assert!(
            matches!(namespace.member("VERSION"), Some(MemberValue::Value(v)) if *v == json!("1.0"))
        );
        assert!(namespace.member("missing").is_none());
    }

    #[test]
    fn enumeration_is_restartable() {
        let provider = Provider::namespace(Namespace::new("n").function(constant("a")));
        assert_eq!(provider.members().unwrap().count(), 1);
        assert_eq!(provider.members().unwrap().count(), 1);
    }

    #[test]
    fn bare_types_are_rejected_by_name() {
        let err = Provider::of_type::<Session>().members().err().expect("should fail");
        assert!(matches!(&err, Error::TypeKind { type_name } if type_name.ends_with("Session")));
        assert!(err.to_string().contains("Session"));
    }

    #[test]
    fn mismatched_reported_type_is_rejected() {
        let err = Provider::instance(Impostor).members().err().expect("should fail");
        assert!(matches!(err, Error::LegacyInstance { reported, .. } if reported == "Proxy"));
    }

    #[test]
    fn instance_members_prefer_the_type_and_skip_property_evaluation() {
        let session = Session::default();
        let reads = Arc::clone(&session.lazy_reads);
        let provider = Provider::instance(session);

        let members: Vec<Member> = provider.members().unwrap().collect();
        let names: Vec<&str> = members.iter().map(Member::name).collect();
        assert_eq!(names, ["alias", "close", "driver", "helper", "timeout"]);

        let timeout = members.iter().find(|m| m.name() == "timeout").unwrap();
        assert!(matches!(timeout.value(), MemberValue::Value(v) if *v == json!(5)));
        let driver = members.iter().find(|m| m.name() == "driver").unwrap();
        assert!(matches!(driver.value(), MemberValue::Property));
        assert_eq!(reads.load(Ordering::SeqCst), 0);

        let keywords: Vec<&str> = members
            .iter()
            .filter_map(Member::keyword)
            .map(|(name, _)| name)
            .collect();
        assert_eq!(keywords, ["close", "helper"]);
    }

    #[test]
    fn instance_member_names_union_type_and_state() {
        let Provider::Instance(instance) = Provider::instance(Session::default()) else {
            unreachable!();
        };
        assert_eq!(
            instance.member_names(),
            ["alias", "close", "driver", "helper", "timeout"]
        );
    }
}
