//! Call arguments and parameter binding.

use crate::error::{CacheError, Result};
use crate::value::TypedValue;

// == Args ==
/// Positional and keyword arguments of one call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    positional: Vec<TypedValue>,
    keyword: Vec<(String, TypedValue)>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional argument.
    pub fn arg(mut self, value: impl Into<TypedValue>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Adds a keyword argument. A repeated name replaces the earlier value.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<TypedValue>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.keyword.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.keyword.push((name, value)),
        }
        self
    }

    pub fn positional(&self) -> &[TypedValue] {
        &self.positional
    }

    pub fn keyword(&self) -> &[(String, TypedValue)] {
        &self.keyword
    }

    /// Looks up an argument by keyword name.
    pub fn get(&self, name: &str) -> Option<&TypedValue> {
        self.keyword
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keyword.is_empty()
    }

    /// Builds arguments from JSON: an object gives keyword arguments, an
    /// array positional ones, any scalar a single positional argument.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        use serde_json::Value;

        let mut args = Args::new();
        match value {
            Value::Object(map) => {
                for (name, value) in map {
                    args = args.kwarg(name.clone(), TypedValue::from_json(value)?);
                }
            }
            Value::Array(items) => {
                for item in items {
                    args = args.arg(TypedValue::from_json(item)?);
                }
            }
            scalar => args = args.arg(TypedValue::from_json(scalar)?),
        }
        Ok(args)
    }
}

// == Signature ==
/// Parameter names of a wrapped function, used to bind positional
/// arguments so that `f(100)` and `f(rows=100)` address the same entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    params: Vec<String>,
}

impl Signature {
    pub fn new<I, S>(params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            params: params.into_iter().map(Into::into).collect(),
        }
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Moves positional arguments onto their parameter names.
    ///
    /// Positionals beyond the declared parameters stay positional. Binding a
    /// name both positionally and by keyword is an error.
    pub fn bind(&self, args: &Args) -> Result<Args> {
        let mut bound = Args::new();
        let mut extra = Vec::new();

        for (index, value) in args.positional.iter().enumerate() {
            match self.params.get(index) {
                Some(name) => {
                    if args.get(name).is_some() {
                        return Err(CacheError::InvalidArgument(format!(
                            "argument '{}' given both positionally and by keyword",
                            name
                        )));
                    }
                    bound.keyword.push((name.clone(), value.clone()));
                }
                None => extra.push(value.clone()),
            }
        }

        bound.positional = extra;
        bound.keyword.extend(args.keyword.iter().cloned());
        Ok(bound)
    }
}
