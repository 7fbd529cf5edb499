//! Keyword discovery, aggregation, and dispatch.
//!
//! A [`HybridCore`] scans an ordered list of [`Provider`]s plus its owning
//! library and keeps every callable that carries exposure metadata. On top of
//! it, [`DynamicCore`] answers the introspection queries a host engine issues
//! and dispatches keyword calls, while [`StaticCore`] covers libraries that
//! only expose their own methods.

#![warn(missing_docs, clippy::pedantic)]

mod callable;
mod config;
mod dynamic;
mod library;
mod provider;
mod registry;
mod static_core;

pub use callable::{Callable, FunctionEntry, KeywordFn};
pub use config::CoreConfig;
pub use dynamic::{DynamicCore, INIT, INTRO, KeywordInfo, KeywordLibrary};
pub use library::{Initializer, Library, LibraryType, Method, TypeMember};
pub use provider::{InstanceProvider, Member, MemberValue, Members, Namespace, Provider};
pub use registry::{HybridCore, Keyword};
pub use static_core::StaticCore;

pub use keyword_primitives::{
    ArgumentBinder, ArgumentSpec, ArgumentSpecBuilder, Arguments, Error, ExposureMetadata,
    KeywordError, KeywordResult, Map, Result, Value, clean_doc,
};
