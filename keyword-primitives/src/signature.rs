//! Argument specifications captured when a keyword is registered.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Receiver name recorded as the first parameter of bound methods.
const RECEIVER: &str = "self";

/// Describes the parameters a keyword accepts.
///
/// Positional parameters are stored in declaration order; `defaults` belong to
/// the trailing positional parameters, so every parameter before them is
/// mandatory.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ArgumentSpec {
    args: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    defaults: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    varargs: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kwargs: Option<String>,
}

impl ArgumentSpec {
    /// Specification of a keyword taking no arguments.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Starts building a specification.
    #[must_use]
    pub fn builder() -> ArgumentSpecBuilder {
        ArgumentSpecBuilder::default()
    }

    /// Assembles a specification from already validated parts.
    ///
    /// Used by generated code, which checks parameter order at compile time.
    #[doc(hidden)]
    #[must_use]
    pub fn from_parts(
        args: Vec<String>,
        defaults: Vec<Value>,
        varargs: Option<String>,
        kwargs: Option<String>,
    ) -> Self {
        Self {
            args,
            defaults,
            varargs,
            kwargs,
        }
    }

    /// Returns a copy with the method receiver recorded as first parameter.
    #[must_use]
    pub fn with_receiver(mut self) -> Self {
        self.args.insert(0, RECEIVER.to_owned());
        self
    }

    /// Returns all positional parameter names, mandatory and defaulted.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Returns the default values of the trailing positional parameters.
    #[must_use]
    pub fn defaults(&self) -> &[Value] {
        &self.defaults
    }

    /// Returns the variadic positional parameter name.
    #[must_use]
    pub fn varargs(&self) -> Option<&str> {
        self.varargs.as_deref()
    }

    /// Returns the variadic keyword parameter name.
    #[must_use]
    pub fn kwargs(&self) -> Option<&str> {
        self.kwargs.as_deref()
    }

    /// Returns the mandatory parameters, skipping the receiver when `bound`.
    #[must_use]
    pub fn mandatory(&self, bound: bool) -> &[String] {
        let args = self.visible(bound);
        &args[..args.len().saturating_sub(self.defaults.len())]
    }

    /// Returns `(name, default)` pairs, skipping the receiver when `bound`.
    pub fn defaulted(&self, bound: bool) -> impl Iterator<Item = (&str, &Value)> {
        let args = self.visible(bound);
        let split = args.len().saturating_sub(self.defaults.len());
        args[split..]
            .iter()
            .map(String::as_str)
            .zip(self.defaults.iter())
    }

    /// Renders the host-facing argument descriptors.
    ///
    /// Mandatory names come first, then `name=default`, then `*varargs` and
    /// `**kwargs`.
    #[must_use]
    pub fn descriptors(&self, bound: bool) -> Vec<String> {
        let mut descriptors: Vec<String> = self.mandatory(bound).to_vec();
        descriptors.extend(
            self.defaulted(bound)
                .map(|(name, value)| format!("{name}={}", render_default(value))),
        );
        if let Some(varargs) = &self.varargs {
            descriptors.push(format!("*{varargs}"));
        }
        if let Some(kwargs) = &self.kwargs {
            descriptors.push(format!("**{kwargs}"));
        }
        descriptors
    }

    fn visible(&self, bound: bool) -> &[String] {
        if bound {
            self.args.get(1..).unwrap_or_default()
        } else {
            &self.args
        }
    }
}

fn render_default(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Builder for [`ArgumentSpec`].
#[derive(Debug, Default)]
pub struct ArgumentSpecBuilder {
    spec: ArgumentSpec,
    violation: Option<String>,
}

impl ArgumentSpecBuilder {
    /// Appends a mandatory positional parameter.
    #[must_use]
    pub fn arg(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.spec.defaults.is_empty() {
            self.reject(format!(
                "mandatory parameter `{name}` follows a parameter with a default"
            ));
        }
        self.push_positional(name);
        self
    }

    /// Appends a positional parameter with a default value.
    #[must_use]
    pub fn arg_with_default(mut self, name: impl Into<String>, default: impl Into<Value>) -> Self {
        self.push_positional(name.into());
        self.spec.defaults.push(default.into());
        self
    }

    /// Declares the variadic positional parameter.
    #[must_use]
    pub fn varargs(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if self.spec.varargs.is_some() {
            self.reject(format!("second variadic parameter `{name}`"));
        }
        if self.spec.kwargs.is_some() {
            self.reject(format!("variadic parameter `{name}` follows keyword parameters"));
        }
        self.spec.varargs = Some(name);
        self
    }

    /// Declares the variadic keyword parameter.
    #[must_use]
    pub fn kwargs(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if self.spec.kwargs.is_some() {
            self.reject(format!("second keyword parameter `{name}`"));
        }
        self.spec.kwargs = Some(name);
        self
    }

    /// Finalises the specification.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSignature`] if parameters were declared out of
    /// order, a name is empty, or a name is used twice.
    pub fn build(self) -> Result<ArgumentSpec> {
        if let Some(reason) = self.violation {
            return Err(Error::invalid_signature(reason));
        }

        let spec = self.spec;
        let mut seen = BTreeSet::new();
        let names = spec
            .args
            .iter()
            .chain(spec.varargs.iter())
            .chain(spec.kwargs.iter());
        for name in names {
            if name.trim().is_empty() {
                return Err(Error::invalid_signature("parameter names cannot be empty"));
            }
            if !seen.insert(name.as_str()) {
                return Err(Error::invalid_signature(format!(
                    "duplicate parameter `{name}`"
                )));
            }
        }

        Ok(spec)
    }

    fn push_positional(&mut self, name: String) {
        if self.spec.varargs.is_some() || self.spec.kwargs.is_some() {
            self.reject(format!("parameter `{name}` follows a variadic parameter"));
        }
        self.spec.args.push(name);
    }

    fn reject(&mut self, reason: String) {
        self.violation.get_or_insert(reason);
    }
}
