//! Typed pipeline stages for view definitions.
//!
//! A pipeline is an ordered list of [`Stage`] values applied to the documents
//! of a source collection. Each stage is a closed variant with a typed
//! payload so definitions can be built and tested without a database.

use crate::store::domain::{CollectionName, FieldPath};

/// Where a field reference is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// The pipeline row being processed.
    Document,
    /// The current array element inside [`Expr::Each`].
    Element,
}

/// Reference to a field in the current row or the current array element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldRef {
    scope: Scope,
    path: FieldPath,
}

impl FieldRef {
    /// References a field of the pipeline row.
    #[must_use]
    pub const fn document(path: FieldPath) -> Self {
        Self {
            scope: Scope::Document,
            path,
        }
    }

    /// References a field of the current array element.
    #[must_use]
    pub const fn element(path: FieldPath) -> Self {
        Self {
            scope: Scope::Element,
            path,
        }
    }

    /// Returns the scope the reference is resolved in.
    #[must_use]
    pub const fn scope(&self) -> Scope {
        self.scope
    }

    /// Returns the referenced path.
    #[must_use]
    pub const fn path(&self) -> &FieldPath {
        &self.path
    }
}

/// Converts an opaque string reference into the identity type.
///
/// Values that are absent or cannot be converted become `null`, which never
/// matches a join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coerce {
    /// Field holding the opaque reference.
    pub source: FieldPath,
    /// Top-level field receiving the identity or `null`.
    pub target: FieldPath,
}

/// Local side of an equality join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalKey {
    /// A single field of the row.
    Field(FieldPath),
    /// The `field` of every element of the array at `array`.
    EachOf {
        /// Array of embedded documents.
        array: FieldPath,
        /// Field of each element used as join key.
        field: FieldPath,
    },
}

/// Left equality join against another namespace.
///
/// Stores every foreign document whose `foreign` field equals a local key as
/// an array under `target`. Null or missing local keys match nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    /// Namespace searched for matches.
    pub from: CollectionName,
    /// Local join key.
    pub local: LocalKey,
    /// Field of the foreign documents compared with the local key.
    pub foreign: FieldPath,
    /// Top-level field receiving the array of matches.
    pub target: FieldPath,
}

/// Expands an array field into one row per element.
///
/// Rows whose field is missing, `null`, or an empty array are dropped, which
/// turns a preceding [`Lookup`] into an inner join. Non-array values pass
/// through unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unwind {
    /// Array field to expand.
    pub path: FieldPath,
}

/// Picks a field from the first array element whose `key` equals a
/// reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolve {
    /// Array searched for a match.
    pub within: FieldRef,
    /// Field of each candidate compared with `reference`.
    pub key: FieldPath,
    /// Value to match.
    pub reference: FieldRef,
    /// Field of the matching candidate to return.
    pub select: FieldPath,
}

/// Projection expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Copies a field; missing fields yield `null`.
    Field(FieldRef),
    /// Renders a value as its display string; `null` stays `null`.
    Display(Box<Expr>),
    /// Resolves a reference against an array; no match yields `null`.
    Resolve(Resolve),
    /// Maps every element of an array to a document, preserving order.
    /// Element-scoped references inside `fields` see the current element.
    Each {
        /// Array to map; non-arrays yield an empty array.
        input: FieldRef,
        /// Output fields of each mapped element.
        fields: Vec<Projection>,
    },
}

impl Expr {
    /// Copies a field of the pipeline row.
    #[must_use]
    pub const fn field(path: FieldPath) -> Self {
        Self::Field(FieldRef::document(path))
    }

    /// Copies a field of the current array element.
    #[must_use]
    pub const fn element(path: FieldPath) -> Self {
        Self::Field(FieldRef::element(path))
    }

    /// Renders the wrapped expression as a display string.
    #[must_use]
    pub fn display(inner: Self) -> Self {
        Self::Display(Box::new(inner))
    }
}

/// Named output field of a projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    /// Output field name; must be a single segment.
    pub name: FieldPath,
    /// Value of the field.
    pub expr: Expr,
}

impl Projection {
    /// Creates a projected field.
    #[must_use]
    pub const fn new(name: FieldPath, expr: Expr) -> Self {
        Self { name, expr }
    }
}

/// Pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    /// Tolerant conversion of a reference to the identity type.
    Coerce(Coerce),
    /// Left equality join.
    Lookup(Lookup),
    /// Array expansion.
    Unwind(Unwind),
    /// Replaces each row with the projected fields. Every listed field is
    /// present in the output.
    Project(Vec<Projection>),
}

impl Stage {
    /// Builds a [`Stage::Coerce`].
    #[must_use]
    pub const fn coerce(source: FieldPath, target: FieldPath) -> Self {
        Self::Coerce(Coerce { source, target })
    }

    /// Builds a [`Stage::Lookup`].
    #[must_use]
    pub const fn lookup(
        from: CollectionName,
        local: LocalKey,
        foreign: FieldPath,
        target: FieldPath,
    ) -> Self {
        Self::Lookup(Lookup {
            from,
            local,
            foreign,
            target,
        })
    }

    /// Builds a [`Stage::Unwind`].
    #[must_use]
    pub const fn unwind(path: FieldPath) -> Self {
        Self::Unwind(Unwind { path })
    }

    /// Builds a [`Stage::Project`].
    #[must_use]
    pub fn project(fields: impl IntoIterator<Item = Projection>) -> Self {
        Self::Project(fields.into_iter().collect())
    }

    /// Returns a short stage label used in logs and errors.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Coerce(_) => "coerce",
            Self::Lookup(_) => "lookup",
            Self::Unwind(_) => "unwind",
            Self::Project(_) => "project",
        }
    }
}

/// Ordered list of stages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pipeline(Vec<Stage>);

impl Pipeline {
    /// Creates a pipeline from stages in application order.
    #[must_use]
    pub fn new(stages: impl IntoIterator<Item = Stage>) -> Self {
        Self(stages.into_iter().collect())
    }

    /// Returns the stages in application order.
    #[must_use]
    pub fn stages(&self) -> &[Stage] {
        &self.0
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when the pipeline has no stages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the namespaces joined by lookups, in stage order.
    pub fn joined_collections(&self) -> impl Iterator<Item = &CollectionName> {
        self.0.iter().filter_map(|stage| match stage {
            Stage::Lookup(lookup) => Some(&lookup.from),
            _ => None,
        })
    }
}
