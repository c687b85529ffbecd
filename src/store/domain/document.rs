//! Document, identifier, filter and update types shared by store adapters.

use super::{CollectionName, FieldPath, StoreDomainError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

/// A stored JSON document.
pub type Document = Map<String, Value>;

/// Field holding the document identity.
pub const ID_FIELD: &str = "_id";

/// Field path of the document identity.
pub const ID_PATH: FieldPath = FieldPath::from_static(ID_FIELD);

/// Identity of a stored document.
///
/// Documents carry their identity under [`ID_FIELD`] as the canonical
/// hyphenated UUID string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Creates a new random document identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a document identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parses a document identifier from its string form.
    ///
    /// # Errors
    ///
    /// Returns [`StoreDomainError::InvalidDocumentId`] when the value is not
    /// a UUID.
    pub fn parse(value: &str) -> Result<Self, StoreDomainError> {
        Uuid::try_parse(value)
            .map(Self)
            .map_err(|_| StoreDomainError::InvalidDocumentId(value.to_owned()))
    }

    /// Reads the identity of a document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreDomainError::InvalidDocumentId`] when the identity
    /// field is missing or is not a UUID string.
    pub fn of(document: &Document) -> Result<Self, StoreDomainError> {
        match document.get(ID_FIELD) {
            Some(Value::String(raw)) => Self::parse(raw),
            Some(other) => Err(StoreDomainError::InvalidDocumentId(other.to_string())),
            None => Err(StoreDomainError::InvalidDocumentId(String::new())),
        }
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }

    /// Returns the identity as the JSON value stored in documents.
    #[must_use]
    pub fn to_value(self) -> Value {
        Value::String(self.0.to_string())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of a namespace listed by the store catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    /// A physical collection holding written documents.
    Collection,
    /// A read-only view derived from a pipeline.
    View,
}

/// Catalog entry for a collection or view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionInfo {
    name: CollectionName,
    kind: CollectionKind,
}

impl CollectionInfo {
    /// Creates a catalog entry.
    #[must_use]
    pub const fn new(name: CollectionName, kind: CollectionKind) -> Self {
        Self { name, kind }
    }

    /// Returns the namespace name.
    #[must_use]
    pub const fn name(&self) -> &CollectionName {
        &self.name
    }

    /// Returns the namespace kind.
    #[must_use]
    pub const fn kind(&self) -> CollectionKind {
        self.kind
    }

    /// Returns `true` when this entry is a view.
    #[must_use]
    pub fn is_view(&self) -> bool {
        self.kind == CollectionKind::View
    }
}

/// Document selection criteria.
///
/// Equality is JSON equality of the value at `field`; a missing field never
/// matches.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches every document.
    All,
    /// Matches documents whose `field` equals `value`.
    Eq {
        /// Field to compare.
        field: FieldPath,
        /// Expected value.
        value: Value,
    },
    /// Matches documents whose `field` equals any of `values`.
    In {
        /// Field to compare.
        field: FieldPath,
        /// Accepted values; an empty list matches nothing.
        values: Vec<Value>,
    },
}

impl Filter {
    /// Matches the document with the given identity.
    #[must_use]
    pub fn by_id(id: impl Into<DocumentId>) -> Self {
        Self::Eq {
            field: ID_PATH,
            value: id.into().to_value(),
        }
    }

    /// Matches documents whose `field` equals `value`.
    #[must_use]
    pub fn eq(field: FieldPath, value: impl Into<Value>) -> Self {
        Self::Eq {
            field,
            value: value.into(),
        }
    }

    /// Matches documents whose `field` equals any of `values`.
    #[must_use]
    pub fn any_of(field: FieldPath, values: impl IntoIterator<Item = Value>) -> Self {
        Self::In {
            field,
            values: values.into_iter().collect(),
        }
    }

    /// Evaluates the filter against a document.
    #[must_use]
    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Self::All => true,
            Self::Eq { field, value } => {
                document_value_at(document, field).is_some_and(|found| found == value)
            }
            Self::In { field, values } => document_value_at(document, field)
                .is_some_and(|found| values.iter().any(|value| value == found)),
        }
    }
}

/// Modification applied to the first document matching a filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    /// Overwrites the given top-level fields.
    Set(Document),
    /// Appends `value` to the array at `field` unless an equal element is
    /// already present. With `unique_by`, elements are compared on that
    /// sub-field only.
    AddToSet {
        /// Array field to extend.
        field: FieldPath,
        /// Element to append.
        value: Value,
        /// Optional element sub-field used for the uniqueness check.
        unique_by: Option<FieldPath>,
    },
    /// Removes every element of the array at `field` equal to `value`. With
    /// `match_on`, elements are compared on that sub-field only.
    Pull {
        /// Array field to shrink.
        field: FieldPath,
        /// Value to remove.
        value: Value,
        /// Optional element sub-field used for matching.
        match_on: Option<FieldPath>,
    },
}

impl Update {
    /// Applies the update to a document, returning whether it changed.
    ///
    /// `AddToSet` creates a missing top-level array; `Pull` on a missing
    /// field is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`StoreDomainError::InvalidUpdate`] when `Set` would change
    /// the identity or when the targeted field holds a non-array value.
    pub fn apply(&self, document: &mut Document) -> Result<bool, StoreDomainError> {
        match self {
            Self::Set(fields) => apply_set(document, fields),
            Self::AddToSet {
                field,
                value,
                unique_by,
            } => {
                let Some(items) = array_mut(document, field, true)? else {
                    return Ok(false);
                };
                let present = match unique_by {
                    Some(key) => {
                        let wanted = value_at(value, key);
                        items.iter().any(|item| value_at(item, key) == wanted)
                    }
                    None => items.contains(value),
                };
                if !present {
                    items.push(value.clone());
                }
                Ok(!present)
            }
            Self::Pull {
                field,
                value,
                match_on,
            } => {
                let Some(items) = array_mut(document, field, false)? else {
                    return Ok(false);
                };
                let before = items.len();
                items.retain(|item| match match_on {
                    Some(key) => value_at(item, key) != Some(value),
                    None => item != value,
                });
                Ok(items.len() != before)
            }
        }
    }
}

fn apply_set(document: &mut Document, fields: &Document) -> Result<bool, StoreDomainError> {
    if let Some(requested) = fields.get(ID_FIELD)
        && document.get(ID_FIELD) != Some(requested)
    {
        return Err(StoreDomainError::InvalidUpdate(format!(
            "{ID_FIELD} is immutable"
        )));
    }
    let mut modified = false;
    for (key, value) in fields {
        if document.get(key) != Some(value) {
            document.insert(key.clone(), value.clone());
            modified = true;
        }
    }
    Ok(modified)
}

/// Returns the array at `path`, creating a missing top-level array when
/// `create` is set.
fn array_mut<'a>(
    document: &'a mut Document,
    path: &FieldPath,
    create: bool,
) -> Result<Option<&'a mut Vec<Value>>, StoreDomainError> {
    let mut segments = path.segments();
    let Some(first) = segments.next() else {
        return Ok(None);
    };
    if create && path.is_top_level() && !document.contains_key(first) {
        document.insert(first.to_owned(), Value::Array(Vec::new()));
    }
    let slot = document
        .get_mut(first)
        .and_then(|root| segments.try_fold(root, descend_mut));
    match slot {
        Some(Value::Array(items)) => Ok(Some(items)),
        None => Ok(None),
        Some(_) => Err(StoreDomainError::InvalidUpdate(format!(
            "{path} does not hold an array"
        ))),
    }
}

/// Result of an update: whether a document matched and whether it changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateOutcome {
    /// A document matched the filter.
    pub matched: bool,
    /// The matched document was changed.
    pub modified: bool,
}

impl UpdateOutcome {
    /// Outcome for a filter that matched nothing.
    pub const NOT_MATCHED: Self = Self {
        matched: false,
        modified: false,
    };

    /// Outcome for a matched document that was left unchanged.
    pub const UNCHANGED: Self = Self {
        matched: true,
        modified: false,
    };

    /// Outcome for a matched document that was changed.
    pub const MODIFIED: Self = Self {
        matched: true,
        modified: true,
    };
}

/// Returns the value at `path` inside `value`, descending through objects
/// and, for numeric segments, array positions.
#[must_use]
pub fn value_at<'a>(value: &'a Value, path: &FieldPath) -> Option<&'a Value> {
    path.segments().try_fold(value, descend)
}

/// Returns the value at `path` inside a document.
#[must_use]
pub fn document_value_at<'a>(document: &'a Document, path: &FieldPath) -> Option<&'a Value> {
    let mut segments = path.segments();
    let root = segments.next().and_then(|first| document.get(first))?;
    segments.try_fold(root, descend)
}

fn descend<'a>(current: &'a Value, segment: &str) -> Option<&'a Value> {
    match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment
            .parse::<usize>()
            .ok()
            .and_then(|index| items.get(index)),
        _ => None,
    }
}

fn descend_mut<'a>(current: &'a mut Value, segment: &str) -> Option<&'a mut Value> {
    match current {
        Value::Object(map) => map.get_mut(segment),
        Value::Array(items) => segment
            .parse::<usize>()
            .ok()
            .and_then(|index| items.get_mut(index)),
        _ => None,
    }
}
