//! Keyword library core facade.
//!
//! Depend on this crate to build keyword libraries for a test automation
//! host. It bundles the shared primitives, the registry, and the
//! `#[keyword]` attribute (enabled by the `macros` feature).
//!
//! ```ignore
//! use keyword_core::{DynamicCore, Namespace, Provider, keyword};
//!
//! #[keyword(tags = ["math"])]
//! /// Adds two numbers.
//! fn add(a: i64, b: i64) -> i64 {
//!     a + b
//! }
//!
//! let core = DynamicCore::new((), [Provider::namespace(Namespace::from_module(module_path!()))])?;
//! assert_eq!(core.keyword_names(), ["add"]);
//! ```

#![warn(missing_docs, clippy::pedantic)]

pub use keyword_primitives as primitives;
pub use keyword_registry as registry;

pub use keyword_registry::{
    ArgumentBinder, ArgumentSpec, ArgumentSpecBuilder, Arguments, Callable, CoreConfig,
    DynamicCore, Error, ExposureMetadata, FunctionEntry, HybridCore, INIT, INTRO, Initializer,
    InstanceProvider, Keyword, KeywordError, KeywordFn, KeywordInfo, KeywordLibrary,
    KeywordResult, Library, LibraryType, Map, Member, MemberValue, Members, Method, Namespace,
    Provider, Result, StaticCore, TypeMember, Value, clean_doc,
};

/// Attribute exposing a function or `&self` method as a keyword (enabled by
/// the `macros` feature).
#[cfg(feature = "macros")]
pub use keyword_macros::keyword;

#[doc(hidden)]
pub mod __private {
    pub use inventory;
    pub use keyword_primitives::{default_value, into_return};
}
