//! Query explorer
//!
//! Sends an arbitrary GraphQL document to the backend and decodes whatever
//! comes back into a [`QueryNode`] tree. When the result holds a list of
//! objects (the usual `allJeuDonnees { ... }` shape) it is also flattened into
//! a [`QueryTable`].

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::session::{AppStore, SessionError};

/// Query sent when none is given
pub const DEFAULT_QUERY: &str = "query {\n  allJeuDonnees {\n    id\n    titre\n    organisation\n  }\n}";

/// Errors from the query explorer
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Query is empty")]
    EmptyQuery,

    /// The backend answered with a GraphQL `errors` array
    #[error("GraphQL error: {}", .0.join("; "))]
    Remote(Vec<String>),

    #[error("Query returned no data")]
    EmptyResult,

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Result type alias for query operations
pub type QueryResult<T> = Result<T, QueryError>;

/// Dynamic result tree
#[derive(Debug, Clone, PartialEq)]
pub enum QueryNode {
    Null,
    Scalar(String),
    List(Vec<QueryNode>),
    /// Fields in response order
    Object(Vec<(String, QueryNode)>),
}

impl QueryNode {
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => QueryNode::Null,
            Value::String(s) => QueryNode::Scalar(s.clone()),
            Value::Bool(_) | Value::Number(_) => QueryNode::Scalar(value.to_string()),
            Value::Array(items) => QueryNode::List(items.iter().map(QueryNode::from_value).collect()),
            Value::Object(map) => QueryNode::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), QueryNode::from_value(v)))
                    .collect(),
            ),
        }
    }

    /// Indented text rendering
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out, 0);
        out
    }

    fn render_into(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        match self {
            QueryNode::Null => out.push_str(&format!("{}null\n", indent)),
            QueryNode::Scalar(s) => out.push_str(&format!("{}{}\n", indent, s)),
            QueryNode::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    out.push_str(&format!("{}[{}]\n", indent, i));
                    item.render_into(out, depth + 1);
                }
            }
            QueryNode::Object(fields) => {
                for (name, node) in fields {
                    match node {
                        QueryNode::Null => out.push_str(&format!("{}{}: null\n", indent, name)),
                        QueryNode::Scalar(s) => out.push_str(&format!("{}{}: {}\n", indent, name, s)),
                        _ => {
                            out.push_str(&format!("{}{}:\n", indent, name));
                            node.render_into(out, depth + 1);
                        }
                    }
                }
            }
        }
    }
}

/// A list of objects flattened into rows
#[derive(Debug, Clone, PartialEq)]
pub struct QueryTable {
    /// Name of the field the list came from
    pub field: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Flatten the first top-level list of objects, if any
pub fn tabulate(data: &Value) -> Option<QueryTable> {
    let (field, objects) = data.as_object()?.iter().find_map(|(k, v)| {
        let items = v.as_array()?;
        let objects: Vec<&serde_json::Map<String, Value>> =
            items.iter().filter_map(Value::as_object).collect();
        (objects.len() == items.len()).then(|| (k.clone(), objects))
    })?;

    let mut columns: Vec<String> = Vec::new();
    for object in &objects {
        for key in object.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    let rows = objects
        .iter()
        .map(|object| {
            columns
                .iter()
                .map(|c| object.get(c).map(cell).unwrap_or_default())
                .collect()
        })
        .collect();

    Some(QueryTable { field, columns, rows })
}

/// Decoded result of a successful query
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome {
    pub data: Value,
    pub tree: QueryNode,
    pub table: Option<QueryTable>,
}

/// Run a query through the session store
pub async fn execute(store: &AppStore, query: &str) -> QueryResult<QueryOutcome> {
    let query = query.trim();
    if query.is_empty() {
        return Err(QueryError::EmptyQuery);
    }

    let response = store.graphql(query).await?;
    if !response.errors.is_empty() {
        let messages: Vec<String> = response.errors.into_iter().map(|e| e.message).collect();
        warn!(errors = messages.len(), "GraphQL query rejected");
        return Err(QueryError::Remote(messages));
    }

    let data = match response.data {
        Some(Value::Null) | None => return Err(QueryError::EmptyResult),
        Some(data) => data,
    };

    let table = tabulate(&data);
    debug!(rows = table.as_ref().map(|t| t.rows.len()), "GraphQL query answered");

    Ok(QueryOutcome {
        tree: QueryNode::from_value(&data),
        table,
        data,
    })
}
