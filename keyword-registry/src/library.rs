//! Library types: the declared members of an instance provider.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use keyword_primitives::{
    ArgumentSpec, Arguments, ExposureMetadata, KeywordResult, Value, clean_doc,
};

use crate::callable::{Callable, KeywordFn};
use crate::provider::Member;

/// A type whose instances can supply keywords.
///
/// [`Library::library_type`] plays the role of the type descriptor: it lists
/// the members declared on the type. Instance-local state is reported
/// separately through [`Library::instance_members`].
pub trait Library: Send + Sync + Sized + 'static {
    /// Describes the members declared on the type.
    fn library_type() -> LibraryType<Self>;

    /// Members held by this particular instance.
    fn instance_members(&self) -> Vec<Member> {
        Vec::new()
    }

    /// Type name this instance reports at runtime.
    ///
    /// Discovery rejects instances whose reported name differs from the type
    /// they were registered as.
    fn reported_type_name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl Library for () {
    fn library_type() -> LibraryType<Self> {
        LibraryType::new()
    }
}

type MethodFn<T> = dyn Fn(&T, Arguments) -> KeywordResult<Value> + Send + Sync;
type PropertyFn<T> = dyn Fn(&T) -> Value + Send + Sync;

/// A method declared on a library type.
pub struct Method<T> {
    name: String,
    func: Arc<MethodFn<T>>,
    spec: ArgumentSpec,
    doc: String,
    exposure: Option<ExposureMetadata>,
}

impl<T> Method<T>
where
    T: Send + Sync + 'static,
{
    /// Creates an unexposed method.
    ///
    /// `spec` lists the parameters after the receiver, which is recorded
    /// automatically.
    #[must_use]
    pub fn new<F>(name: impl Into<String>, spec: ArgumentSpec, func: F) -> Self
    where
        F: Fn(&T, Arguments) -> KeywordResult<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
            spec: spec.with_receiver(),
            doc: String::new(),
            exposure: None,
        }
    }

    /// Sets the documentation, normalised with [`clean_doc`].
    #[must_use]
    pub fn with_doc(mut self, doc: &str) -> Self {
        self.doc = clean_doc(doc);
        self
    }

    /// Attaches exposure metadata, turning the method into a keyword.
    #[must_use]
    pub fn exposed(mut self, metadata: ExposureMetadata) -> Self {
        self.exposure = Some(metadata);
        self
    }

    /// The method's own name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn bind(&self, instance: &Arc<T>) -> Callable {
        let instance = Arc::clone(instance);
        let func = Arc::clone(&self.func);
        let bound: Arc<KeywordFn> =
            Arc::new(move |arguments: Arguments| func(&instance, arguments));
        Callable::bound(
            self.name.clone(),
            bound,
            self.spec.clone(),
            self.doc.clone(),
            self.exposure.clone(),
        )
    }
}

impl<T> fmt::Debug for Method<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("name", &self.name)
            .field("spec", &self.spec)
            .field("exposure", &self.exposure)
            .finish_non_exhaustive()
    }
}

/// A member declared on a library type.
pub enum TypeMember<T> {
    /// Method bound to the instance on discovery.
    Method(Method<T>),
    /// Computed attribute. Discovery never evaluates it.
    Property(Arc<PropertyFn<T>>),
    /// Plain value shared by all instances.
    Constant(Value),
}

impl<T> fmt::Debug for TypeMember<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Method(method) => f.debug_tuple("Method").field(method).finish(),
            Self::Property(_) => f.write_str("Property"),
            Self::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
        }
    }
}

/// Documentation and arguments of a library's initializer.
#[derive(Clone, Debug, Default)]
pub struct Initializer {
    spec: ArgumentSpec,
    doc: String,
}

impl Initializer {
    /// Initializer arguments, without the receiver.
    #[must_use]
    pub fn spec(&self) -> &ArgumentSpec {
        &self.spec
    }

    /// Initializer documentation.
    #[must_use]
    pub fn doc(&self) -> &str {
        &self.doc
    }
}

/// Declared members and documentation of a library type.
pub struct LibraryType<T> {
    name: &'static str,
    doc: String,
    init: Initializer,
    members: BTreeMap<String, TypeMember<T>>,
}

impl<T> LibraryType<T>
where
    T: Send + Sync + 'static,
{
    /// Creates an empty description named after `T`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: std::any::type_name::<T>(),
            doc: String::new(),
            init: Initializer::default(),
            members: BTreeMap::new(),
        }
    }

    /// Sets the library-level documentation.
    #[must_use]
    pub fn with_doc(mut self, doc: &str) -> Self {
        self.doc = clean_doc(doc);
        self
    }

    /// Describes the initializer's arguments and documentation.
    #[must_use]
    pub fn with_init(mut self, spec: ArgumentSpec, doc: &str) -> Self {
        self.init = Initializer {
            spec,
            doc: clean_doc(doc),
        };
        self
    }

    /// Declares a method; a later declaration with the same name replaces it.
    #[must_use]
    pub fn method(mut self, method: Method<T>) -> Self {
        self.members
            .insert(method.name.clone(), TypeMember::Method(method));
        self
    }

    /// Declares a computed attribute.
    #[must_use]
    pub fn property<F>(mut self, name: impl Into<String>, getter: F) -> Self
    where
        F: Fn(&T) -> Value + Send + Sync + 'static,
    {
        self.members
            .insert(name.into(), TypeMember::Property(Arc::new(getter)));
        self
    }

    /// Declares a constant attribute.
    #[must_use]
    pub fn constant(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.members
            .insert(name.into(), TypeMember::Constant(value.into()));
        self
    }
}

impl<T> Default for LibraryType<T>
where
    T: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> LibraryType<T> {
    /// Type name the description was created for.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Library-level documentation.
    #[must_use]
    pub fn doc(&self) -> &str {
        &self.doc
    }

    /// Initializer description.
    #[must_use]
    pub fn init(&self) -> &Initializer {
        &self.init
    }

    /// Looks up a declared member.
    #[must_use]
    pub fn member(&self, name: &str) -> Option<&TypeMember<T>> {
        self.members.get(name)
    }

    /// Names of all declared members, sorted.
    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.members.keys().map(String::as_str)
    }

    /// Evaluates a declared property against `instance`.
    ///
    /// Returns `None` when `name` is not a property.
    #[must_use]
    pub fn evaluate_property(&self, instance: &T, name: &str) -> Option<Value> {
        match self.members.get(name)? {
            TypeMember::Property(getter) => Some(getter(instance)),
            TypeMember::Method(_) | TypeMember::Constant(_) => None,
        }
    }
}

impl<T> fmt::Debug for LibraryType<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LibraryType")
            .field("name", &self.name)
            .field("members", &self.members)
            .finish_non_exhaustive()
    }
}
