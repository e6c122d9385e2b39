//! Cypher statement builder.
//!
//! Turns a declarative node search or upsert into statement text plus a map
//! of bound parameters. Labels and property names are checked against the
//! fixed schema in `roster_core::schema` before they are written into the
//! text; every value travels as a parameter.

use std::collections::{BTreeMap, BTreeSet};

use roster_core::schema::is_identifier;
use roster_core::{NodeLabel, PropertyMap};

use crate::client::GraphError;

/// Parameter holding the value of the match key.
pub const MATCH_PARAM: &str = "matchValue";

/// Variable bound to the matched node in every generated statement.
pub const NODE_VAR: &str = "n";

/// Identifies exactly one node by a single equality property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSpec {
    pub node_label: NodeLabel,
    pub match_key: String,
    pub match_value: String,
}

impl SearchSpec {
    pub fn new(
        node_label: NodeLabel,
        match_key: impl Into<String>,
        match_value: impl Into<String>,
    ) -> Self {
        Self {
            node_label,
            match_key: match_key.into(),
            match_value: match_value.into(),
        }
    }

    /// Search on the label's key property.
    pub fn by_key(node_label: NodeLabel, value: impl Into<String>) -> Self {
        Self::new(node_label, node_label.key_property(), value)
    }
}

/// Multi-node search with conjunctive equality filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiSearchSpec {
    pub node_label: NodeLabel,
    pub filters: PropertyMap,
    /// Maximum number of nodes; 0 means unbounded.
    pub limit: u64,
    /// Properties to order by, in order of precedence.
    pub order_by: Vec<String>,
    /// Applies to every ORDER BY key.
    pub descending: bool,
}

impl MultiSearchSpec {
    pub fn new(node_label: NodeLabel) -> Self {
        Self {
            node_label,
            filters: PropertyMap::new(),
            limit: 0,
            order_by: Vec::new(),
            descending: false,
        }
    }

    pub fn filter(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(property.into(), value.into());
        self
    }

    pub fn order_by(mut self, property: impl Into<String>) -> Self {
        self.order_by.push(property.into());
        self
    }

    pub fn descending(mut self, descending: bool) -> Self {
        self.descending = descending;
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }
}

/// Shape of each result row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// Named output columns, one per requested property.
    Columns(Vec<String>),
    /// The whole node bound to the given variable.
    Node(&'static str),
}

/// A compiled statement ready for the session executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub text: String,
    pub params: BTreeMap<String, String>,
    pub projection: Projection,
    pub label: NodeLabel,
    /// Match key and value for single-node statements.
    pub subject: Option<(String, String)>,
}

impl Statement {
    /// `(key, value)` for error reporting, empty for label-wide statements.
    pub(crate) fn subject_parts(&self) -> (String, String) {
        self.subject.clone().unwrap_or_default()
    }
}

/// Build a MERGE that creates or updates the node matched by `spec` and
/// returns every written property under its own name.
pub fn upsert(spec: &SearchSpec, properties: &PropertyMap) -> Result<Statement, GraphError> {
    let label = spec.node_label;
    let key = schema_property(label, &spec.match_key)?;

    if properties.is_empty() {
        return Err(GraphError::InvalidArgument(format!(
            "upsert of {label} with {key} = {} has no properties to set",
            spec.match_value
        )));
    }
    if let Some(value) = properties.get(key) {
        if value != &spec.match_value {
            return Err(GraphError::InvalidArgument(format!(
                "{label}.{key} is matched on {:?} but set to {value:?}",
                spec.match_value
            )));
        }
    }

    let mut assignments = Vec::with_capacity(properties.len());
    let mut returns = Vec::with_capacity(properties.len());
    let mut params = BTreeMap::new();
    for (name, value) in properties {
        let property = schema_property(label, name)?;
        assignments.push(format!("{NODE_VAR}.{property} = ${property}"));
        returns.push(format!("{NODE_VAR}.{property} AS {property}"));
        params.insert(property.to_string(), value.clone());
    }
    params.insert(MATCH_PARAM.to_string(), spec.match_value.clone());

    let set_clause = assignments.join(", ");
    let text = format!(
        "MERGE ({NODE_VAR}:{label} {{{key}: ${MATCH_PARAM}}}) \
         ON CREATE SET {set_clause} \
         ON MATCH SET {set_clause} \
         RETURN {}",
        returns.join(", ")
    );

    Ok(Statement {
        text,
        params,
        projection: Projection::Columns(properties.keys().cloned().collect()),
        label,
        subject: Some((key.to_string(), spec.match_value.clone())),
    })
}

/// Build a MATCH on the spec's key returning the requested properties as
/// named columns. Repeated names are returned once. With no properties the
/// node itself is returned and rows map to empty property maps.
pub fn find_one<S: AsRef<str>>(
    spec: &SearchSpec,
    return_properties: &[S],
) -> Result<Statement, GraphError> {
    let label = spec.node_label;
    let key = schema_property(label, &spec.match_key)?;

    let mut seen = BTreeSet::new();
    let mut columns = Vec::with_capacity(return_properties.len());
    for name in return_properties {
        let property = schema_property(label, name.as_ref())?;
        if seen.insert(property) {
            columns.push(property);
        }
    }

    let returns = if columns.is_empty() {
        NODE_VAR.to_string()
    } else {
        columns
            .iter()
            .map(|p| format!("{NODE_VAR}.{p} AS {p}"))
            .collect::<Vec<_>>()
            .join(", ")
    };

    Ok(Statement {
        text: format!("MATCH ({NODE_VAR}:{label} {{{key}: ${MATCH_PARAM}}}) RETURN {returns}"),
        params: BTreeMap::from([(MATCH_PARAM.to_string(), spec.match_value.clone())]),
        projection: Projection::Columns(columns.into_iter().map(str::to_string).collect()),
        label,
        subject: Some((key.to_string(), spec.match_value.clone())),
    })
}

/// Build a label scan filtered by every entry of `spec.filters`, returning
/// whole nodes with optional ordering and limit.
pub fn find_many(spec: &MultiSearchSpec) -> Result<Statement, GraphError> {
    let label = spec.node_label;

    let mut predicates = Vec::with_capacity(spec.filters.len());
    let mut params = BTreeMap::new();
    for (name, value) in &spec.filters {
        let property = schema_property(label, name)?;
        predicates.push(format!("{NODE_VAR}.{property} = ${property}"));
        params.insert(property.to_string(), value.clone());
    }

    let direction = if spec.descending { " DESC" } else { "" };
    let mut ordering = Vec::with_capacity(spec.order_by.len());
    for name in &spec.order_by {
        let property = schema_property(label, name)?;
        ordering.push(format!("{NODE_VAR}.{property}{direction}"));
    }

    let mut text = format!("MATCH ({NODE_VAR}:{label})");
    if !predicates.is_empty() {
        text.push_str(" WHERE ");
        text.push_str(&predicates.join(" AND "));
    }
    text.push_str(&format!(" RETURN {NODE_VAR}"));
    if !ordering.is_empty() {
        text.push_str(" ORDER BY ");
        text.push_str(&ordering.join(", "));
    }
    if spec.limit > 0 {
        text.push_str(&format!(" LIMIT {}", spec.limit));
    }

    Ok(Statement {
        text,
        params,
        projection: Projection::Node(NODE_VAR),
        label,
        subject: None,
    })
}

/// Resolve `name` to the label's static identifier. Only names that are both
/// in the schema and plain identifiers are ever spliced into statement text.
fn schema_property(label: NodeLabel, name: &str) -> Result<&'static str, GraphError> {
    label
        .property(name)
        .filter(|property| is_identifier(property))
        .ok_or_else(|| {
            GraphError::InvalidArgument(format!("{name:?} is not a property of {label}"))
        })
}
