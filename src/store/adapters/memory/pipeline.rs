//! Evaluates view pipelines over in-memory documents.

use crate::store::domain::{CollectionName, Document, FieldPath, document_value_at, value_at};
use crate::store::ports::{StoreError, StoreResult};
use crate::view::domain::{
    Coerce, Expr, FieldRef, LocalKey, Lookup, Projection, Resolve, Scope, Stage, Unwind,
    ViewDefinition,
};
use serde_json::Value;
use uuid::Uuid;

/// Computes the rows of a view.
///
/// `rows_of` returns the current rows of a namespace, or `None` when it does
/// not exist.
pub(super) fn materialize<'a, F>(definition: &ViewDefinition, rows_of: F) -> StoreResult<Vec<Document>>
where
    F: Fn(&CollectionName) -> Option<&'a [Document]>,
{
    let source = rows_of(definition.source()).ok_or_else(|| StoreError::InvalidDefinition {
        view: definition.name().clone(),
        reason: format!("source collection {} does not exist", definition.source()),
    })?;

    let mut rows = source.to_vec();
    for stage in definition.pipeline().stages() {
        rows = match stage {
            Stage::Coerce(coerce) => rows.into_iter().map(|row| apply_coerce(coerce, row)).collect(),
            Stage::Lookup(lookup) => {
                let foreign = rows_of(&lookup.from).ok_or_else(|| StoreError::InvalidDefinition {
                    view: definition.name().clone(),
                    reason: format!("lookup collection {} does not exist", lookup.from),
                })?;
                rows.into_iter()
                    .map(|row| apply_lookup(lookup, foreign, row))
                    .collect()
            }
            Stage::Unwind(unwind) => rows
                .into_iter()
                .flat_map(|row| apply_unwind(unwind, row))
                .collect(),
            Stage::Project(fields) => rows
                .iter()
                .map(|row| project(fields, row, None))
                .collect(),
        };
    }
    Ok(rows)
}

fn apply_coerce(coerce: &Coerce, mut row: Document) -> Document {
    let identity = match document_value_at(&row, &coerce.source) {
        Some(Value::String(raw)) => Uuid::try_parse(raw)
            .map(|uuid| Value::String(uuid.to_string()))
            .unwrap_or(Value::Null),
        _ => Value::Null,
    };
    row.insert(coerce.target.as_str().to_owned(), identity);
    row
}

fn apply_lookup(lookup: &Lookup, foreign: &[Document], mut row: Document) -> Document {
    let keys = local_keys(&lookup.local, &row);
    let matches = foreign
        .iter()
        .filter(|candidate| {
            document_value_at(candidate, &lookup.foreign)
                .is_some_and(|found| keys.contains(&found))
        })
        .cloned()
        .map(Value::Object)
        .collect();
    row.insert(lookup.target.as_str().to_owned(), Value::Array(matches));
    row
}

fn local_keys<'a>(local: &LocalKey, row: &'a Document) -> Vec<&'a Value> {
    match local {
        LocalKey::Field(path) => document_value_at(row, path)
            .filter(|value| !value.is_null())
            .into_iter()
            .collect(),
        LocalKey::EachOf { array, field } => match document_value_at(row, array) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| value_at(item, field))
                .filter(|value| !value.is_null())
                .collect(),
            _ => Vec::new(),
        },
    }
}

fn apply_unwind(unwind: &Unwind, row: Document) -> Vec<Document> {
    let elements = match document_value_at(&row, &unwind.path) {
        Some(Value::Array(items)) => items.clone(),
        Some(Value::Null) | None => return Vec::new(),
        Some(_) => return vec![row],
    };
    let pointer = json_pointer(&unwind.path);
    elements
        .into_iter()
        .filter_map(|element| {
            let mut expanded = Value::Object(row.clone());
            *expanded.pointer_mut(&pointer)? = element;
            match expanded {
                Value::Object(document) => Some(document),
                _ => None,
            }
        })
        .collect()
}

fn json_pointer(path: &FieldPath) -> String {
    path.segments().fold(String::new(), |mut pointer, segment| {
        pointer.push('/');
        pointer.push_str(segment);
        pointer
    })
}

fn project(fields: &[Projection], row: &Document, element: Option<&Value>) -> Document {
    fields
        .iter()
        .map(|projection| {
            (
                projection.name.as_str().to_owned(),
                evaluate(&projection.expr, row, element),
            )
        })
        .collect()
}

fn lookup_ref<'a>(
    reference: &FieldRef,
    row: &'a Document,
    element: Option<&'a Value>,
) -> Option<&'a Value> {
    match reference.scope() {
        Scope::Document => document_value_at(row, reference.path()),
        Scope::Element => element.and_then(|current| value_at(current, reference.path())),
    }
}

fn evaluate(expr: &Expr, row: &Document, element: Option<&Value>) -> Value {
    match expr {
        Expr::Field(reference) => lookup_ref(reference, row, element)
            .cloned()
            .unwrap_or(Value::Null),
        Expr::Display(inner) => match evaluate(inner, row, element) {
            Value::Null => Value::Null,
            Value::String(text) => Value::String(text),
            other => Value::String(other.to_string()),
        },
        Expr::Resolve(resolve) => resolve_reference(resolve, row, element),
        Expr::Each { input, fields } => match lookup_ref(input, row, element) {
            Some(Value::Array(items)) => Value::Array(
                items
                    .iter()
                    .map(|item| Value::Object(project(fields, row, Some(item))))
                    .collect(),
            ),
            _ => Value::Array(Vec::new()),
        },
    }
}

fn resolve_reference(resolve: &Resolve, row: &Document, element: Option<&Value>) -> Value {
    let Some(reference) = lookup_ref(&resolve.reference, row, element).filter(|v| !v.is_null())
    else {
        return Value::Null;
    };
    let Some(Value::Array(candidates)) = lookup_ref(&resolve.within, row, element) else {
        return Value::Null;
    };
    candidates
        .iter()
        .find(|candidate| value_at(candidate, &resolve.key) == Some(reference))
        .and_then(|candidate| value_at(candidate, &resolve.select))
        .cloned()
        .unwrap_or(Value::Null)
}
