//! Validated collection names and field paths.
//!
//! Both types are restricted to identifier characters so the `PostgreSQL`
//! adapter can interpolate them into DDL and JSON path literals without
//! escaping. Compile-time constants are built with the `from_static`
//! constructors, which reject invalid literals during const evaluation.

use super::StoreDomainError;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Largest identifier length accepted by `PostgreSQL` without truncation.
const MAX_IDENTIFIER_LEN: usize = 63;

/// Name of a raw collection or a derived view.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CollectionName(Cow<'static, str>);

impl CollectionName {
    /// Creates a collection name from a string literal.
    ///
    /// # Panics
    ///
    /// Panics when `name` is not a valid collection name. In a `const`
    /// context the panic surfaces as a compile error.
    #[must_use]
    pub const fn from_static(name: &'static str) -> Self {
        assert!(
            is_valid_collection_name(name),
            "collection names must match [a-z_][a-z0-9_]*"
        );
        Self(Cow::Borrowed(name))
    }

    /// Creates a validated collection name.
    ///
    /// # Errors
    ///
    /// Returns [`StoreDomainError::InvalidCollectionName`] when the value is
    /// empty, too long, or contains characters outside `[a-z0-9_]`.
    pub fn new(name: impl Into<String>) -> Result<Self, StoreDomainError> {
        let raw = name.into();
        if !is_valid_collection_name(&raw) {
            return Err(StoreDomainError::InvalidCollectionName(raw));
        }
        Ok(Self(Cow::Owned(raw)))
    }

    /// Returns the name as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CollectionName {
    type Error = StoreDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CollectionName> for String {
    fn from(value: CollectionName) -> Self {
        value.0.into_owned()
    }
}

impl AsRef<str> for CollectionName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Dot-separated path to a field inside a document, such as `team.name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldPath(Cow<'static, str>);

impl FieldPath {
    /// Creates a field path from a string literal.
    ///
    /// # Panics
    ///
    /// Panics when `path` is not a valid field path. In a `const` context the
    /// panic surfaces as a compile error.
    #[must_use]
    pub const fn from_static(path: &'static str) -> Self {
        assert!(
            is_valid_field_path(path),
            "field paths must be dot-separated [A-Za-z0-9_] segments"
        );
        Self(Cow::Borrowed(path))
    }

    /// Parses a validated field path.
    ///
    /// # Errors
    ///
    /// Returns [`StoreDomainError::InvalidFieldPath`] when a segment is empty
    /// or contains characters outside `[A-Za-z0-9_]`.
    pub fn parse(path: impl Into<String>) -> Result<Self, StoreDomainError> {
        let raw = path.into();
        if !is_valid_field_path(&raw) {
            return Err(StoreDomainError::InvalidFieldPath(raw));
        }
        Ok(Self(Cow::Owned(raw)))
    }

    /// Returns the path as written, for example `team.name`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterates over the path segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// Returns `true` when the path names a top-level field.
    #[must_use]
    pub fn is_top_level(&self) -> bool {
        !self.0.contains('.')
    }
}

impl TryFrom<String> for FieldPath {
    type Error = StoreDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<FieldPath> for String {
    fn from(value: FieldPath) -> Self {
        value.0.into_owned()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

const fn is_valid_collection_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    if bytes.is_empty() || bytes.len() > MAX_IDENTIFIER_LEN {
        return false;
    }
    let mut rest = bytes;
    let mut leading = true;
    while let [byte, tail @ ..] = rest {
        let allowed = byte.is_ascii_lowercase()
            || *byte == b'_'
            || (!leading && byte.is_ascii_digit());
        if !allowed {
            return false;
        }
        leading = false;
        rest = tail;
    }
    true
}

const fn is_valid_field_path(path: &str) -> bool {
    let mut rest = path.as_bytes();
    let mut segment_len = 0_usize;
    while let [byte, tail @ ..] = rest {
        if *byte == b'.' {
            if segment_len == 0 {
                return false;
            }
            segment_len = 0;
        } else if byte.is_ascii_alphanumeric() || *byte == b'_' {
            segment_len += 1;
        } else {
            return false;
        }
        rest = tail;
    }
    segment_len > 0
}
