//! Key-value protocol fields and the `key:value\n` form.
//!
//! [`KvFields`] is the minimal message abstraction used at the seams of this
//! crate: the parameters of an associate request, the fields of a provider's
//! reply, and the serialized form of a stored association. Namespace handling
//! is the caller's concern; keys here are already unqualified.

use std::collections::BTreeMap;

/// Errors produced while encoding or decoding key-value form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum KvError {
    /// A key contains `:` or a newline.
    #[error("invalid key in key-value form: {0:?}")]
    InvalidKey(String),

    /// A value contains a newline.
    #[error("invalid value for key {key:?} in key-value form")]
    InvalidValue { key: String },

    /// A line has no `:` separator.
    #[error("line {line} is not in key:value form")]
    MalformedLine { line: usize },
}

/// Unordered protocol fields addressable by key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KvFields(BTreeMap<String, String>);

impl KvFields {
    /// Create an empty field set.
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a field, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Look up a field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Merge `other` into `self`; fields in `other` win.
    pub fn extend(&mut self, other: KvFields) {
        self.0.extend(other.0);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for KvFields {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Encode ordered pairs as key-value form.
///
/// Each pair becomes `key:value\n`. Order is preserved because signatures are
/// computed over this exact byte sequence.
///
/// # Errors
///
/// Returns [`KvError`] if a key contains `:` or `\n`, or a value contains `\n`.
pub fn encode_kv<K, V>(pairs: &[(K, V)]) -> Result<String, KvError>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut out = String::new();
    for (key, value) in pairs {
        let (key, value) = (key.as_ref(), value.as_ref());
        if key.contains(':') || key.contains('\n') {
            return Err(KvError::InvalidKey(key.to_string()));
        }
        if value.contains('\n') {
            return Err(KvError::InvalidValue {
                key: key.to_string(),
            });
        }
        out.push_str(key);
        out.push(':');
        out.push_str(value);
        out.push('\n');
    }
    Ok(out)
}

/// Decode key-value form into ordered pairs.
///
/// Blank lines are skipped. Only the first `:` separates key from value.
///
/// # Errors
///
/// Returns [`KvError::MalformedLine`] (1-based) for a line without `:`.
pub fn parse_kv(text: &str) -> Result<Vec<(String, String)>, KvError> {
    let mut pairs = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        if line.is_empty() {
            continue;
        }
        let (key, value) = line
            .split_once(':')
            .ok_or(KvError::MalformedLine { line: idx + 1 })?;
        pairs.push((key.to_string(), value.to_string()));
    }
    Ok(pairs)
}
