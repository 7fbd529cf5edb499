//! Dynamic calling convention shared by hosts and keyword implementations.

use std::collections::VecDeque;
use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{KeywordError, KeywordResult};

/// Positional and named arguments supplied by the host for one invocation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Arguments {
    positional: Vec<Value>,
    named: Map<String, Value>,
}

impl Arguments {
    /// Creates arguments from host-supplied positional and named values.
    #[must_use]
    pub fn new(positional: Vec<Value>, named: Map<String, Value>) -> Self {
        Self { positional, named }
    }

    /// Creates positional-only arguments.
    #[must_use]
    pub fn positional<I>(values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        Self {
            positional: values.into_iter().map(Into::into).collect(),
            named: Map::new(),
        }
    }

    /// Adds a named argument.
    #[must_use]
    pub fn with_named(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.named.insert(name.into(), value.into());
        self
    }

    /// Returns the positional values.
    #[must_use]
    pub fn positional_values(&self) -> &[Value] {
        &self.positional
    }

    /// Returns the named values.
    #[must_use]
    pub fn named_values(&self) -> &Map<String, Value> {
        &self.named
    }

    /// Splits the arguments into their positional and named parts.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Value>, Map<String, Value>) {
        (self.positional, self.named)
    }

    /// Starts binding the arguments to the parameters of `keyword`.
    #[must_use]
    pub fn binder(self, keyword: impl Into<String>) -> ArgumentBinder {
        ArgumentBinder {
            keyword: keyword.into(),
            given: self.positional.len(),
            positional: self.positional.into(),
            named: self.named,
            declared: 0,
        }
    }
}

/// Binds [`Arguments`] to parameters in declaration order.
///
/// Each parameter takes the next positional value if one is left, otherwise the
/// named value with its name. [`ArgumentBinder::finish`] rejects leftovers.
#[derive(Debug)]
pub struct ArgumentBinder {
    keyword: String,
    positional: VecDeque<Value>,
    named: Map<String, Value>,
    declared: usize,
    given: usize,
}

impl ArgumentBinder {
    /// Binds a mandatory parameter.
    ///
    /// # Errors
    ///
    /// Returns [`KeywordError::MissingArgument`] when no value was supplied,
    /// [`KeywordError::MultipleValues`] when it was supplied twice, or
    /// [`KeywordError::InvalidArgument`] when the value does not convert.
    pub fn required<T>(&mut self, name: &str) -> KeywordResult<T>
    where
        T: DeserializeOwned,
    {
        match self.take(name)? {
            Some(value) => self.decode(name, value),
            None => Err(KeywordError::MissingArgument {
                keyword: self.keyword.clone(),
                name: name.to_owned(),
            }),
        }
    }

    /// Binds a parameter that falls back to `default` when not supplied.
    ///
    /// # Errors
    ///
    /// Returns [`KeywordError::MultipleValues`] or
    /// [`KeywordError::InvalidArgument`] as [`ArgumentBinder::required`] does.
    pub fn optional<T, F>(&mut self, name: &str, default: F) -> KeywordResult<T>
    where
        T: DeserializeOwned,
        F: FnOnce() -> T,
    {
        match self.take(name)? {
            Some(value) => self.decode(name, value),
            None => Ok(default()),
        }
    }

    /// Collects every remaining positional value.
    ///
    /// # Errors
    ///
    /// Returns [`KeywordError::InvalidArgument`] when the values do not convert
    /// into `T`.
    pub fn varargs<T>(&mut self, name: &str) -> KeywordResult<T>
    where
        T: DeserializeOwned,
    {
        let rest: Vec<Value> = self.positional.drain(..).collect();
        self.decode(name, Value::Array(rest))
    }

    /// Collects every remaining named value.
    ///
    /// # Errors
    ///
    /// Returns [`KeywordError::InvalidArgument`] when the values do not convert
    /// into `T`.
    pub fn kwargs<T>(&mut self, name: &str) -> KeywordResult<T>
    where
        T: DeserializeOwned,
    {
        let rest = std::mem::take(&mut self.named);
        self.decode(name, Value::Object(rest))
    }

    /// Checks that every supplied argument was bound.
    ///
    /// # Errors
    ///
    /// Returns [`KeywordError::TooManyArguments`] for leftover positional values
    /// and [`KeywordError::UnexpectedArgument`] for leftover named values.
    pub fn finish(self) -> KeywordResult<()> {
        if !self.positional.is_empty() {
            return Err(KeywordError::TooManyArguments {
                keyword: self.keyword,
                expected: self.declared,
                given: self.given,
            });
        }
        if let Some(name) = self.named.keys().next() {
            return Err(KeywordError::UnexpectedArgument {
                name: name.clone(),
                keyword: self.keyword,
            });
        }
        Ok(())
    }

    fn take(&mut self, name: &str) -> KeywordResult<Option<Value>> {
        self.declared += 1;
        match self.positional.pop_front() {
            Some(_) if self.named.contains_key(name) => Err(KeywordError::MultipleValues {
                keyword: self.keyword.clone(),
                name: name.to_owned(),
            }),
            Some(value) => Ok(Some(value)),
            None => Ok(self.named.remove(name)),
        }
    }

    fn decode<T>(&self, name: &str, value: Value) -> KeywordResult<T>
    where
        T: DeserializeOwned,
    {
        serde_json::from_value(value).map_err(|source| KeywordError::InvalidArgument {
            keyword: self.keyword.clone(),
            name: name.to_owned(),
            source,
        })
    }
}

/// Converts a keyword return value into its host representation.
///
/// # Errors
///
/// Returns [`KeywordError::InvalidReturn`] when `value` cannot be serialized.
#[doc(hidden)]
pub fn into_return<T>(keyword: &str, value: T) -> KeywordResult<Value>
where
    T: Serialize,
{
    serde_json::to_value(value).map_err(|source| KeywordError::InvalidReturn {
        keyword: keyword.to_owned(),
        source,
    })
}

/// Renders a parameter default for the argument specification.
///
/// A default that cannot be represented as a [`Value`] is recorded as its
/// `Debug` text. Non-finite floats have no JSON form and are recorded as
/// `null`.
#[doc(hidden)]
#[must_use]
pub fn default_value<T>(value: T) -> Value
where
    T: Serialize + fmt::Debug,
{
    serde_json::to_value(&value).unwrap_or_else(|_| Value::String(format!("{value:?}")))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn bind_add(arguments: Arguments) -> KeywordResult<(i64, i64)> {
        let mut binder = arguments.binder("add");
        let a: i64 = binder.required("a")?;
        let b: i64 = binder.required("b")?;
        binder.finish()?;
        Ok((a, b))
    }

    #[test]
    fn binds_positional_then_named() {
        assert_eq!(bind_add(Arguments::positional([1, 2])).unwrap(), (1, 2));
        let mixed = Arguments::positional([1]).with_named("b", 5);
        assert_eq!(bind_add(mixed).unwrap(), (1, 5));
        let named = Arguments::default().with_named("b", 2).with_named("a", 1);
        assert_eq!(bind_add(named).unwrap(), (1, 2));
    }

    #[test]
    fn missing_argument_is_reported() {
        let err = bind_add(Arguments::positional([1])).unwrap_err();
        assert!(
            matches!(&err, KeywordError::MissingArgument { keyword, name } if keyword == "add" && name == "b")
        );
        assert_eq!(err.to_string(), "add() missing required argument `b`");
    }

    #[test]
    fn too_many_positionals_are_reported() {
        let err = bind_add(Arguments::positional([1, 2, 3])).unwrap_err();
        assert!(matches!(
            err,
            KeywordError::TooManyArguments {
                expected: 2,
                given: 3,
                ..
            }
        ));
    }

    #[test]
    fn duplicate_and_unknown_names_are_reported() {
        let err = bind_add(Arguments::positional([1, 2]).with_named("a", 3)).unwrap_err();
        assert!(matches!(err, KeywordError::MultipleValues { name, .. } if name == "a"));

        let err = bind_add(Arguments::positional([1, 2]).with_named("z", 3)).unwrap_err();
        assert!(matches!(err, KeywordError::UnexpectedArgument { name, .. } if name == "z"));
    }

    #[test]
    fn conversion_failures_name_the_parameter() {
        let err = bind_add(Arguments::positional([json!(1), json!("two")])).unwrap_err();
        assert!(matches!(err, KeywordError::InvalidArgument { name, .. } if name == "b"));
    }

    #[test]
    fn defaults_and_variadics_collect_the_rest() {
        let arguments = Arguments::positional([json!("x"), json!(1), json!(2)]).with_named("k", "v");
        let mut binder = arguments.binder("collect");
        let first: String = binder.required("first").unwrap();
        let second: i64 = binder.optional("second", || 10).unwrap();
        let rest: Vec<i64> = binder.varargs("rest").unwrap();
        let options: Map<String, Value> = binder.kwargs("options").unwrap();
        binder.finish().unwrap();

        assert_eq!(first, "x");
        assert_eq!(second, 1);
        assert_eq!(rest, [2]);
        assert_eq!(options.get("k"), Some(&json!("v")));
    }

    #[test]
    fn optional_uses_default_when_absent() {
        let mut binder = Arguments::default().binder("f");
        let value: String = binder.optional("mode", || "fast".to_owned()).unwrap();
        assert_eq!(value, "fast");
        binder.finish().unwrap();
    }

    #[test]
    fn unit_return_becomes_null() {
        assert_eq!(into_return("noop", ()).unwrap(), Value::Null);
        assert_eq!(default_value(Some(3)), json!(3));
        assert_eq!(default_value(None::<String>), Value::Null);
    }

    #[test]
    fn unrepresentable_defaults_fall_back_to_debug_text() {
        let grid: std::collections::BTreeMap<(u8, u8), u8> = [((1, 2), 3)].into_iter().collect();
        assert_eq!(default_value(grid), json!("{(1, 2): 3}"));
        assert_eq!(default_value(f64::NAN), Value::Null);
    }

    #[test]
    fn raw_values_are_available_without_binding() {
        let arguments = Arguments::positional([1, 2]).with_named("mode", "fast");
        assert_eq!(arguments.positional_values(), [json!(1), json!(2)]);
        assert_eq!(arguments.named_values().get("mode"), Some(&json!("fast")));

        let (positional, named) = arguments.into_parts();
        assert_eq!(positional.len(), 2);
        assert_eq!(named.len(), 1);
    }
}
