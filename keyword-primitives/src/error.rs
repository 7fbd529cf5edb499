//! Shared error definitions for the keyword runtime.

use thiserror::Error;

/// Result alias used by registry construction and host-facing queries.
pub type Result<T> = std::result::Result<T, Error>;

/// Result alias returned by keyword implementations.
pub type KeywordResult<T> = std::result::Result<T, KeywordError>;

/// Errors raised by the registry while discovering, resolving or dispatching
/// keywords.
#[derive(Debug, Error)]
pub enum Error {
    /// A provider was a bare type rather than a namespace or an instance.
    #[error("libraries must be namespaces or instances, got type `{type_name}` instead")]
    TypeKind {
        /// Name of the offending type.
        type_name: String,
    },

    /// A provider instance reported a type that differs from the one it was
    /// declared with.
    #[error("library instance of `{declared}` reports itself as `{reported}`")]
    LegacyInstance {
        /// Type the instance was wrapped as.
        declared: String,
        /// Type the instance reports at runtime.
        reported: String,
    },

    /// Lookup of an unknown keyword or attribute.
    #[error("`{owner}` object has no attribute `{name}`")]
    AttributeNotFound {
        /// Name that was looked up.
        name: String,
        /// Type owning the registry.
        owner: String,
    },

    /// A programmatically built argument specification was malformed.
    #[error("invalid argument specification: {reason}")]
    InvalidSignature {
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// Failure produced by the invoked keyword itself.
    #[error(transparent)]
    Keyword(#[from] KeywordError),
}

impl Error {
    pub(crate) fn invalid_signature(reason: impl Into<String>) -> Self {
        Self::InvalidSignature {
            reason: reason.into(),
        }
    }
}

/// Errors produced by a keyword while binding its arguments or running its
/// body.
#[derive(Debug, Error)]
pub enum KeywordError {
    /// A mandatory argument was supplied neither positionally nor by name.
    #[error("{keyword}() missing required argument `{name}`")]
    MissingArgument {
        /// Keyword that was invoked.
        keyword: String,
        /// Missing parameter.
        name: String,
    },

    /// More positional arguments were supplied than the keyword accepts.
    #[error("{keyword}() takes {expected} positional arguments but {given} were given")]
    TooManyArguments {
        /// Keyword that was invoked.
        keyword: String,
        /// Number of positional parameters declared.
        expected: usize,
        /// Number of positional arguments supplied.
        given: usize,
    },

    /// A parameter received both a positional and a named value.
    #[error("{keyword}() got multiple values for argument `{name}`")]
    MultipleValues {
        /// Keyword that was invoked.
        keyword: String,
        /// Parameter bound twice.
        name: String,
    },

    /// A named argument matched no parameter.
    #[error("{keyword}() got an unexpected keyword argument `{name}`")]
    UnexpectedArgument {
        /// Keyword that was invoked.
        keyword: String,
        /// Unmatched argument name.
        name: String,
    },

    /// An argument could not be converted into the parameter type.
    #[error("{keyword}() argument `{name}` is invalid: {source}")]
    InvalidArgument {
        /// Keyword that was invoked.
        keyword: String,
        /// Parameter being bound.
        name: String,
        /// Conversion failure.
        source: serde_json::Error,
    },

    /// The keyword returned a value with no host representation.
    #[error("{keyword}() returned a value that cannot be represented: {source}")]
    InvalidReturn {
        /// Keyword that was invoked.
        keyword: String,
        /// Conversion failure.
        source: serde_json::Error,
    },

    /// Error returned by the keyword body.
    #[error(transparent)]
    Failed(Box<dyn std::error::Error + Send + Sync>),
}

impl KeywordError {
    /// Wraps an error returned by a keyword body.
    ///
    /// The wrapped value keeps its `Display` output and can be recovered with
    /// [`KeywordError::downcast_ref`].
    #[must_use]
    pub fn failed(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Failed(err.into())
    }

    /// Returns the error returned by the keyword body if it has type `E`.
    #[must_use]
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: std::error::Error + 'static,
    {
        match self {
            Self::Failed(err) => err.downcast_ref::<E>(),
            _ => None,
        }
    }
}
