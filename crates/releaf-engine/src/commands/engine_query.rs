//! Read-only queries over the persisted tree
//!
//! `apply_engine_query` takes a shared connection and never writes. Each
//! query hydrates the tree it needs; the last-updated timestamp is read
//! straight from the settings table.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use releaf_content::errors::ExError;
use releaf_content::queries;
use releaf_content::{log_op_end, log_op_error, log_op_start};
use releaf_content::{ContentObject, Node, NodeId, NodeSchema, Tree};
use releaf_core_types::RequestContext;
use releaf_store::errors::Result;
use releaf_store::repo::hydration::load_tree;
use releaf_store::repo::SqliteRepo;
use rusqlite::Connection;
use serde::Serialize;

/// Read-only queries supported by the engine
#[derive(Debug, Clone, PartialEq)]
pub enum EngineQuery {
    NodeGet { node_id: NodeId },
    /// Every node in nested-set order
    NodeList,
    /// Direct children of a node, or the roots
    NodeChildren { parent_id: Option<NodeId> },
    /// Root first, excluding the node itself
    NodeAncestors { node_id: NodeId },
    NodeLocale { node_id: NodeId },
    NodeAvailable { node_id: NodeId },
    NodeContent { node_id: NodeId },
    /// Type names a new node under `parent_id` may take
    ValidContentTypes { parent_id: Option<NodeId> },
    ContentFieldsToDisplay { node_id: NodeId, view: String },
    NodesUpdatedAt,
}

impl EngineQuery {
    fn op_name(&self) -> &'static str {
        match self {
            EngineQuery::NodeGet { .. } => "node_get",
            EngineQuery::NodeList => "node_list",
            EngineQuery::NodeChildren { .. } => "node_children",
            EngineQuery::NodeAncestors { .. } => "node_ancestors",
            EngineQuery::NodeLocale { .. } => "node_locale",
            EngineQuery::NodeAvailable { .. } => "node_available",
            EngineQuery::NodeContent { .. } => "node_content",
            EngineQuery::ValidContentTypes { .. } => "valid_content_types",
            EngineQuery::ContentFieldsToDisplay { .. } => "content_fields_to_display",
            EngineQuery::NodesUpdatedAt => "nodes_updated_at",
        }
    }
}

/// Locale of a node, with the request's fallbacks applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeLocale {
    /// Own or nearest ancestor's locale
    pub resolved: Option<String>,
    /// `resolved`, else the request locale, else the configured default
    pub effective: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum EngineQueryResult {
    Node(Node),
    Nodes(Vec<Node>),
    Locale(NodeLocale),
    Available(bool),
    Content(Option<ContentObject>),
    ContentTypes(Vec<String>),
    Fields(Option<Vec<String>>),
    UpdatedAt(Option<DateTime<Utc>>),
}

/// Apply a read-only engine query
///
/// # Errors
///
/// `NotFound` for unknown nodes or missing content objects,
/// `Persistence`/`Serialization` when the stored tree can't be read.
pub fn apply_engine_query(
    query: EngineQuery,
    conn: &Connection,
    schema: &Arc<NodeSchema>,
    ctx: &RequestContext,
) -> Result<EngineQueryResult> {
    let op = query.op_name();
    log_op_start!(op, request_id = ctx.request_id.as_str());
    let start = Instant::now();

    let result = run_query(query, conn, schema, ctx);

    let elapsed = start.elapsed().as_millis() as u64;
    match &result {
        Ok(_) => log_op_end!(op, duration_ms = elapsed),
        Err(e) => {
            let e_clone = e.clone();
            log_op_error!(op, e_clone, duration_ms = elapsed);
        }
    }
    result.map_err(|e| e.with_op(op).with_request_id(ctx.request_id.clone()))
}

fn run_query(
    query: EngineQuery,
    conn: &Connection,
    schema: &Arc<NodeSchema>,
    ctx: &RequestContext,
) -> Result<EngineQueryResult> {
    if query == EngineQuery::NodesUpdatedAt {
        return Ok(EngineQueryResult::UpdatedAt(SqliteRepo::get_nodes_updated_at(
            conn,
        )?));
    }

    let tree = load_tree(conn, schema.clone())?;
    let result = match query {
        EngineQuery::NodeGet { node_id } => {
            EngineQueryResult::Node(tree.get(node_id).map_err(ExError::from)?.clone())
        }
        EngineQuery::NodeList => EngineQueryResult::Nodes(owned(tree.list_nodes())),
        EngineQuery::NodeChildren { parent_id } => {
            if let Some(parent_id) = parent_id {
                tree.get(parent_id).map_err(ExError::from)?;
            }
            EngineQueryResult::Nodes(owned(tree.children(parent_id)))
        }
        EngineQuery::NodeAncestors { node_id } => {
            EngineQueryResult::Nodes(owned(tree.ancestors(node_id).map_err(ExError::from)?))
        }
        EngineQuery::NodeLocale { node_id } => {
            EngineQueryResult::Locale(node_locale(&tree, node_id, ctx)?)
        }
        EngineQuery::NodeAvailable { node_id } => EngineQueryResult::Available(
            queries::is_available(&tree, node_id).map_err(ExError::from)?,
        ),
        EngineQuery::NodeContent { node_id } => EngineQueryResult::Content(
            queries::node_content(&tree, node_id)
                .map_err(ExError::from)?
                .cloned(),
        ),
        EngineQuery::ValidContentTypes { parent_id } => {
            if let Some(parent_id) = parent_id {
                tree.get(parent_id).map_err(ExError::from)?;
            }
            EngineQueryResult::ContentTypes(queries::valid_node_content_classes(&tree, parent_id))
        }
        EngineQuery::ContentFieldsToDisplay { node_id, view } => EngineQueryResult::Fields(
            queries::content_fields_to_display(&tree, node_id, &view).map_err(ExError::from)?,
        ),
        EngineQuery::NodesUpdatedAt => EngineQueryResult::UpdatedAt(tree.nodes_updated_at()),
    };
    Ok(result)
}

fn node_locale(tree: &Tree, node_id: NodeId, ctx: &RequestContext) -> Result<NodeLocale> {
    let resolved = queries::locale(tree, node_id).map_err(ExError::from)?;
    let effective = resolved
        .clone()
        .or_else(|| ctx.locale.clone())
        .or_else(|| tree.schema().default_locale.clone());
    Ok(NodeLocale {
        resolved,
        effective,
    })
}

fn owned(nodes: Vec<&Node>) -> Vec<Node> {
    nodes.into_iter().cloned().collect()
}
