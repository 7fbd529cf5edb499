//! Callable handles and the module inventory used by `#[keyword]`.

use std::fmt;
use std::sync::Arc;

use keyword_primitives::{
    ArgumentSpec, Arguments, ExposureMetadata, KeywordResult, Value, clean_doc,
};

/// Erased keyword implementation.
pub type KeywordFn = dyn Fn(Arguments) -> KeywordResult<Value> + Send + Sync;

/// A callable member: implementation plus the metadata captured when it was
/// registered.
#[derive(Clone)]
pub struct Callable {
    name: String,
    func: Arc<KeywordFn>,
    spec: ArgumentSpec,
    doc: String,
    exposure: Option<ExposureMetadata>,
    bound: bool,
}

impl Callable {
    /// Creates an unexposed callable named `name`.
    #[must_use]
    pub fn new<F>(name: impl Into<String>, spec: ArgumentSpec, func: F) -> Self
    where
        F: Fn(Arguments) -> KeywordResult<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
            spec,
            doc: String::new(),
            exposure: None,
            bound: false,
        }
    }

    /// Sets the documentation, normalised with [`clean_doc`].
    #[must_use]
    pub fn with_doc(mut self, doc: &str) -> Self {
        self.doc = clean_doc(doc);
        self
    }

    /// Attaches exposure metadata, turning the callable into a keyword.
    #[must_use]
    pub fn exposed(mut self, metadata: ExposureMetadata) -> Self {
        self.exposure = Some(metadata);
        self
    }

    pub(crate) fn bound(
        name: String,
        func: Arc<KeywordFn>,
        spec: ArgumentSpec,
        doc: String,
        exposure: Option<ExposureMetadata>,
    ) -> Self {
        Self {
            name,
            func,
            spec,
            doc,
            exposure,
            bound: true,
        }
    }

    /// The callable's own name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The argument specification captured at registration time.
    #[must_use]
    pub fn spec(&self) -> &ArgumentSpec {
        &self.spec
    }

    /// Cleaned documentation text, possibly empty.
    #[must_use]
    pub fn doc(&self) -> &str {
        &self.doc
    }

    /// Exposure metadata, present only for keywords.
    #[must_use]
    pub fn exposure(&self) -> Option<&ExposureMetadata> {
        self.exposure.as_ref()
    }

    /// Tags from the exposure metadata.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        self.exposure
            .as_ref()
            .map(ExposureMetadata::tags)
            .unwrap_or_default()
    }

    /// Returns `true` when the callable is a method bound to an instance.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.bound
    }

    /// Name under which the callable is registered, if it is exposed.
    #[must_use]
    pub fn keyword_name(&self) -> Option<&str> {
        self.exposure
            .as_ref()
            .map(|metadata| metadata.exposed_name(&self.name))
    }

    /// Invokes the implementation.
    ///
    /// # Errors
    ///
    /// Returns whatever the implementation returns.
    pub fn call(&self, arguments: Arguments) -> KeywordResult<Value> {
        (self.func)(arguments)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("name", &self.name)
            .field("spec", &self.spec)
            .field("exposure", &self.exposure)
            .field("bound", &self.bound)
            .finish_non_exhaustive()
    }
}

/// Inventory entry submitted by `#[keyword]` for each free function.
#[derive(Debug)]
pub struct FunctionEntry {
    module: &'static str,
    build: fn() -> Callable,
}

impl FunctionEntry {
    /// Creates an entry for a function defined in `module`.
    #[must_use]
    pub const fn new(module: &'static str, build: fn() -> Callable) -> Self {
        Self { module, build }
    }

    /// Module path the function was defined in.
    #[must_use]
    pub const fn module(&self) -> &'static str {
        self.module
    }

    /// Builds the callable.
    #[must_use]
    pub fn callable(&self) -> Callable {
        (self.build)()
    }
}

inventory::collect!(FunctionEntry);

/// Returns the callables submitted for `module`, sorted by name.
pub(crate) fn module_functions(module: &str) -> Vec<Callable> {
    let mut functions: Vec<Callable> = inventory::iter::<FunctionEntry>
        .into_iter()
        .filter(|entry| entry.module() == module)
        .map(FunctionEntry::callable)
        .collect();
    functions.sort_by(|a, b| a.name.cmp(&b.name));
    functions
}
