//! SQL text for the `PostgreSQL` document store.
//!
//! Collections are tables `(id UUID PRIMARY KEY, document JSONB NOT NULL)`.
//! Views are materialized views with one `document` column, compiled from a
//! pipeline into a chain of CTEs where each stage reads the previous one.
//! Identifiers and paths are validated value objects restricted to
//! `[A-Za-z0-9_]`, so they are inlined; document values are always bound.

use crate::store::domain::{CollectionName, Document, FieldPath, Filter};
use crate::view::domain::{
    Coerce, Expr, FieldRef, LocalKey, Lookup, Projection, Resolve, Scope, Stage, Unwind,
    ViewDefinition,
};
use serde_json::Value;

/// SQL text with its JSONB parameters in bind order.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct Statement {
    pub(super) sql: String,
    pub(super) params: Vec<Value>,
}

#[derive(Debug, Default)]
struct Binds(Vec<Value>);

impl Binds {
    fn push(&mut self, value: Value) -> String {
        self.0.push(value);
        format!("${}::jsonb", self.0.len())
    }
}

/// Lists tables, materialized views and plain views of the current schema.
pub(super) const LIST_NAMESPACES: &str = concat!(
    "SELECT c.relname::text AS name, c.relkind::text AS relkind ",
    "FROM pg_catalog.pg_class c ",
    "JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace ",
    "WHERE n.nspname = current_schema() AND c.relkind IN ('r', 'm', 'v') ",
    "ORDER BY c.relname",
);

/// Returns the namespace named by the first bind parameter, if any.
pub(super) const FIND_NAMESPACE: &str = concat!(
    "SELECT c.relname::text AS name, c.relkind::text AS relkind ",
    "FROM pg_catalog.pg_class c ",
    "JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace ",
    "WHERE n.nspname = current_schema() AND c.relkind IN ('r', 'm', 'v') ",
    "AND c.relname = $1",
);

/// Quotes a collection name as an identifier.
pub(super) fn quote(name: &CollectionName) -> String {
    format!("\"{name}\"")
}

fn path_literal(path: &FieldPath) -> String {
    let joined: Vec<&str> = path.segments().collect();
    format!("'{{{}}}'", joined.join(","))
}

fn extract(base: &str, path: &FieldPath) -> String {
    format!("{base} #> {}", path_literal(path))
}

fn condition(filter: &Filter, binds: &mut Binds) -> String {
    match filter {
        Filter::All => "TRUE".to_owned(),
        Filter::Eq { field, value } => {
            format!("{} = {}", extract("document", field), binds.push(value.clone()))
        }
        Filter::In { values, .. } if values.is_empty() => "FALSE".to_owned(),
        Filter::In { field, values } => {
            let placeholders: Vec<String> = values
                .iter()
                .map(|value| binds.push(value.clone()))
                .collect();
            format!(
                "{} IN ({})",
                extract("document", field),
                placeholders.join(", ")
            )
        }
    }
}

/// Selects matching documents, optionally only the first.
pub(super) fn select(collection: &CollectionName, filter: &Filter, first_only: bool) -> Statement {
    let mut binds = Binds::default();
    let mut sql = format!(
        "SELECT document FROM {} WHERE {}",
        quote(collection),
        condition(filter, &mut binds)
    );
    if first_only {
        sql.push_str(" LIMIT 1");
    }
    Statement {
        sql,
        params: binds.0,
    }
}

/// Selects and locks the first matching row with its key.
pub(super) fn select_for_update(collection: &CollectionName, filter: &Filter) -> Statement {
    let mut binds = Binds::default();
    let sql = format!(
        "SELECT id, document FROM {} WHERE {} LIMIT 1 FOR UPDATE",
        quote(collection),
        condition(filter, &mut binds)
    );
    Statement {
        sql,
        params: binds.0,
    }
}

/// Inserts a document keyed by its `_id`.
pub(super) fn insert(collection: &CollectionName, document: &Document) -> Statement {
    Statement {
        sql: format!(
            "INSERT INTO {} (id, document) VALUES (($1::jsonb ->> '_id')::uuid, $1::jsonb)",
            quote(collection)
        ),
        params: vec![Value::Object(document.clone())],
    }
}

/// Replaces the document of the row whose key is the second parameter.
pub(super) fn replace(collection: &CollectionName) -> String {
    format!(
        "UPDATE {} SET document = $1 WHERE id = $2",
        quote(collection)
    )
}

/// Deletes the first matching row.
pub(super) fn delete(collection: &CollectionName, filter: &Filter) -> Statement {
    let mut binds = Binds::default();
    let table = quote(collection);
    let sql = format!(
        "DELETE FROM {table} WHERE id IN (SELECT id FROM {table} WHERE {} LIMIT 1)",
        condition(filter, &mut binds)
    );
    Statement {
        sql,
        params: binds.0,
    }
}

/// Creates an empty collection table.
pub(super) fn create_table(collection: &CollectionName) -> String {
    format!(
        "CREATE TABLE {} (id UUID PRIMARY KEY, document JSONB NOT NULL)",
        quote(collection)
    )
}

/// Drops a namespace according to its `pg_class.relkind`.
pub(super) fn drop(name: &CollectionName, relkind: &str) -> String {
    let kind = match relkind {
        "m" => "MATERIALIZED VIEW",
        "v" => "VIEW",
        _ => "TABLE",
    };
    format!("DROP {kind} {}", quote(name))
}

/// Recomputes a materialized view.
pub(super) fn refresh(view: &CollectionName) -> String {
    format!("REFRESH MATERIALIZED VIEW {}", quote(view))
}

/// Compiles a view definition into `CREATE MATERIALIZED VIEW`.
pub(super) fn create_view(definition: &ViewDefinition) -> String {
    let mut compiler = ViewCompiler::default();
    let mut ctes = vec![format!(
        "s0 AS (SELECT src.document AS doc FROM {} AS src)",
        quote(definition.source())
    )];
    for (index, stage) in definition.pipeline().stages().iter().enumerate() {
        let from = format!("s{index}");
        let body = compiler.stage(stage, &from);
        ctes.push(format!("s{} AS ({body})", index + 1));
    }
    format!(
        "CREATE MATERIALIZED VIEW {} AS WITH {} SELECT doc AS document FROM s{}",
        quote(definition.name()),
        ctes.join(", "),
        definition.pipeline().len()
    )
}

fn array_or_empty(expr: &str) -> String {
    format!("CASE WHEN jsonb_typeof({expr}) = 'array' THEN {expr} ELSE '[]'::jsonb END")
}

#[derive(Debug, Default)]
struct ViewCompiler {
    aliases: usize,
}

impl ViewCompiler {
    fn alias(&mut self, prefix: &str) -> String {
        self.aliases += 1;
        format!("{prefix}{}", self.aliases)
    }

    fn stage(&mut self, stage: &Stage, from: &str) -> String {
        match stage {
            Stage::Coerce(coerce) => Self::coerce(coerce, from),
            Stage::Lookup(lookup) => self.lookup(lookup, from),
            Stage::Unwind(unwind) => Self::unwind(unwind, from),
            Stage::Project(fields) => {
                let object = self.object(fields, None);
                format!("SELECT {object} AS doc FROM {from} AS src")
            }
        }
    }

    fn coerce(coerce: &Coerce, from: &str) -> String {
        format!(
            concat!(
                "SELECT jsonb_set(src.doc, {target}, ",
                "COALESCE(to_jsonb(try_cast_uuid(src.doc #>> {source})::text), 'null'::jsonb), ",
                "true) AS doc FROM {from} AS src"
            ),
            target = path_literal(&coerce.target),
            source = path_literal(&coerce.source),
            from = from,
        )
    }

    fn lookup(&mut self, lookup: &Lookup, from: &str) -> String {
        let foreign_alias = self.alias("f");
        let foreign = extract(&format!("{foreign_alias}.document"), &lookup.foreign);
        let matches = match &lookup.local {
            LocalKey::Field(path) => {
                let local = extract("src.doc", path);
                format!("{foreign} = {local} AND jsonb_typeof({local}) <> 'null'")
            }
            LocalKey::EachOf { array, field } => {
                let element = self.alias("k");
                let key = extract(&format!("{element}.value"), field);
                format!(
                    concat!(
                        "{foreign} IN (SELECT {key} FROM jsonb_array_elements({elements}) ",
                        "AS {element}(value) WHERE jsonb_typeof({key}) <> 'null')"
                    ),
                    foreign = foreign,
                    key = key,
                    elements = array_or_empty(&extract("src.doc", array)),
                    element = element,
                )
            }
        };
        format!(
            concat!(
                "SELECT jsonb_set(src.doc, {target}, COALESCE((SELECT jsonb_agg({alias}.document) ",
                "FROM {table} AS {alias} WHERE {matches}), '[]'::jsonb), true) AS doc ",
                "FROM {from} AS src"
            ),
            target = path_literal(&lookup.target),
            alias = foreign_alias,
            table = quote(&lookup.from),
            matches = matches,
            from = from,
        )
    }

    fn unwind(unwind: &Unwind, from: &str) -> String {
        let value = extract("src.doc", &unwind.path);
        format!(
            concat!(
                "SELECT jsonb_set(src.doc, {path}, u.elem, true) AS doc FROM {from} AS src ",
                "CROSS JOIN LATERAL jsonb_array_elements(CASE ",
                "WHEN jsonb_typeof({value}) = 'array' THEN {value} ",
                "WHEN {value} IS NULL OR jsonb_typeof({value}) = 'null' THEN '[]'::jsonb ",
                "ELSE jsonb_build_array({value}) END) WITH ORDINALITY AS u(elem, pos)"
            ),
            path = path_literal(&unwind.path),
            from = from,
            value = value,
        )
    }

    fn object(&mut self, fields: &[Projection], element: Option<&str>) -> String {
        let pairs: Vec<String> = fields
            .iter()
            .map(|projection| {
                let value = self.expr(&projection.expr, element);
                format!("'{}', {value}", projection.name)
            })
            .collect();
        format!("jsonb_build_object({})", pairs.join(", "))
    }

    fn reference(reference: &FieldRef, element: Option<&str>) -> String {
        match (reference.scope(), element) {
            (Scope::Element, Some(alias)) => extract(&format!("{alias}.value"), reference.path()),
            (Scope::Element, None) => "NULL::jsonb".to_owned(),
            (Scope::Document, _) => extract("src.doc", reference.path()),
        }
    }

    fn expr(&mut self, expr: &Expr, element: Option<&str>) -> String {
        match expr {
            Expr::Field(reference) => Self::reference(reference, element),
            Expr::Display(inner) => {
                let value = self.expr(inner, element);
                format!(
                    concat!(
                        "CASE jsonb_typeof({value}) WHEN 'string' THEN {value} ",
                        "WHEN 'null' THEN 'null'::jsonb ELSE to_jsonb(({value})::text) END"
                    ),
                    value = value
                )
            }
            Expr::Resolve(resolve) => self.resolve(resolve, element),
            Expr::Each { input, fields } => {
                let alias = self.alias("e");
                let object = self.object(fields, Some(&alias));
                format!(
                    concat!(
                        "COALESCE((SELECT jsonb_agg({object} ORDER BY {alias}.pos) ",
                        "FROM jsonb_array_elements({elements}) WITH ORDINALITY ",
                        "AS {alias}(value, pos)), '[]'::jsonb)"
                    ),
                    object = object,
                    alias = alias,
                    elements = array_or_empty(&Self::reference(input, element)),
                )
            }
        }
    }

    fn resolve(&mut self, resolve: &Resolve, element: Option<&str>) -> String {
        let alias = self.alias("r");
        let reference = Self::reference(&resolve.reference, element);
        format!(
            concat!(
                "(SELECT {select} FROM jsonb_array_elements({within}) WITH ORDINALITY ",
                "AS {alias}(value, pos) WHERE {key} = {reference} ",
                "AND jsonb_typeof({reference}) <> 'null' ORDER BY {alias}.pos LIMIT 1)"
            ),
            select = extract(&format!("{alias}.value"), &resolve.select),
            within = array_or_empty(&Self::reference(&resolve.within, element)),
            alias = alias,
            key = extract(&format!("{alias}.value"), &resolve.key),
            reference = reference,
        )
    }
}
