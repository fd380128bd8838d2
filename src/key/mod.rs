//! Key Module
//!
//! Derives cache keys from a namespace, a function identity and call
//! arguments.
//!
//! # Key Format
//! `{prefix}:{function}:{positional}:{keyword}`
//!
//! Positional values are joined with `,` in call order. Keyword arguments
//! render as `name=value`, sorted by name and joined with `,`, so keyword
//! order never changes the key. A call without arguments ends in `::`.

mod args;
mod fingerprint;


use std::fmt;

use crate::error::{CacheError, Result};

pub use args::{Args, Signature};

// == Cache Key ==
/// A derived store key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// == Key Builder ==
/// Builds keys under one namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBuilder {
    prefix: String,
}

impl KeyBuilder {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Derives the key for one call of `function`.
    ///
    /// # Errors
    /// `InvalidArgument` for an empty function identity or a keyword name
    /// that is empty or contains a separator character.
    pub fn build(&self, function: &str, args: &Args) -> Result<CacheKey> {
        if function.is_empty() {
            return Err(CacheError::InvalidArgument(
                "function identity must not be empty".to_string(),
            ));
        }

        let positional = args
            .positional()
            .iter()
            .map(fingerprint::render)
            .collect::<Vec<_>>()
            .join(",");

        let mut keyword = args.keyword().iter().collect::<Vec<_>>();
        keyword.sort_by(|(a, _), (b, _)| a.cmp(b));
        let keyword = keyword
            .into_iter()
            .map(|(name, value)| {
                validate_name(name)?;
                Ok(format!("{}={}", name, fingerprint::render(value)))
            })
            .collect::<Result<Vec<_>>>()?
            .join(",");

        Ok(CacheKey(format!(
            "{}:{}:{}:{}",
            self.prefix, function, positional, keyword
        )))
    }
}

fn validate_name(name: &str) -> Result<()> {
    let bad_char = name
        .chars()
        .find(|c| matches!(c, '=' | ',' | ':') || c.is_whitespace());
    if name.is_empty() || bad_char.is_some() {
        return Err(CacheError::InvalidArgument(format!(
            "invalid keyword argument name {:?}",
            name
        )));
    }
    Ok(())
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_call_key() {
        let keys = KeyBuilder::new("demo");
        let key = keys.build("f", &Args::new().kwarg("rows", 100i64)).unwrap();
        assert_eq!(key.as_str(), "demo:f::rows=100");
    }

    #[test]
    fn test_zero_args_key() {
        let keys = KeyBuilder::new("demo");
        let key = keys.build("f", &Args::new()).unwrap();
        assert_eq!(key.to_string(), "demo:f::");
    }

    #[test]
    fn test_positional_and_keyword_segments() {
        let keys = KeyBuilder::new("ns");
        let args = Args::new().arg(1i64).arg("x").kwarg("b", true).kwarg("a", 2.5f64);
        let key = keys.build("mod::func", &args).unwrap();
        assert_eq!(key.as_str(), "ns:mod::func:1,\"x\":a=2.5,b=true");
    }

    #[test]
    fn test_keyword_order_ignored() {
        let keys = KeyBuilder::new("demo");
        let a = keys
            .build("f", &Args::new().kwarg("a", 1i64).kwarg("b", 2i64))
            .unwrap();
        let b = keys
            .build("f", &Args::new().kwarg("b", 2i64).kwarg("a", 1i64))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_positional_order_matters() {
        let keys = KeyBuilder::new("demo");
        let a = keys.build("f", &Args::new().arg(1i64).arg(2i64)).unwrap();
        let b = keys.build("f", &Args::new().arg(2i64).arg(1i64)).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_positional_differs_from_keyword_without_signature() {
        let keys = KeyBuilder::new("demo");
        let a = keys.build("f", &Args::new().arg(100i64)).unwrap();
        let b = keys.build("f", &Args::new().kwarg("rows", 100i64)).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_bound_positional_matches_keyword() {
        let keys = KeyBuilder::new("demo");
        let signature = Signature::new(["rows"]);
        let positional = signature.bind(&Args::new().arg(100i64)).unwrap();

        assert_eq!(
            keys.build("f", &positional).unwrap().as_str(),
            "demo:f::rows=100"
        );
    }

    #[test]
    fn test_function_identity_and_prefix_separate_keys() {
        let args = Args::new().arg(1i64);
        let a = KeyBuilder::new("demo").build("f", &args).unwrap();
        let b = KeyBuilder::new("demo").build("g", &args).unwrap();
        let c = KeyBuilder::new("test").build("f", &args).unwrap();
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let keys = KeyBuilder::new("demo");
        assert!(matches!(
            keys.build("", &Args::new()),
            Err(CacheError::InvalidArgument(_))
        ));
        assert!(matches!(
            keys.build("f", &Args::new().kwarg("a=b", 1i64)),
            Err(CacheError::InvalidArgument(_))
        ));
        assert!(matches!(
            keys.build("f", &Args::new().kwarg("", 1i64)),
            Err(CacheError::InvalidArgument(_))
        ));
    }
}
