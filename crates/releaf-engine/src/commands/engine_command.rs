//! Node commands against the SQLite store
//!
//! Each command is one `BEGIN IMMEDIATE` transaction: hydrate the tree,
//! apply the command in memory, persist the row differences, commit. The
//! immediate lock serializes concurrent structural changes, and the
//! validate-and-save of a command never sees another writer's rows.

use std::sync::Arc;
use std::time::Instant;

use releaf_content::errors::ExError;
use releaf_content::{apply, Command, CommandOutcome, NodeSchema};
use releaf_content::{log_op_end, log_op_error, log_op_start};
use releaf_core_types::RequestContext;
use releaf_store::errors::{from_rusqlite, Result};
use releaf_store::repo::hydration::load_tree_for_update;
use releaf_store::repo::{persist_tree_changes, PersistStats, SqliteRepo};
use rusqlite::{Connection, TransactionBehavior};

/// Outcome of a committed node command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeCommandResult {
    pub outcome: CommandOutcome,
    pub stats: PersistStats,
}

/// Apply one node command and commit it
///
/// Nothing is written when the command fails: the transaction is dropped
/// and rolled back.
///
/// # Errors
///
/// The command's `ExError` (validation, not found, integrity) tagged with
/// the operation and request id, or `Persistence` on a database failure.
pub fn apply_node_command(
    cmd: Command,
    conn: &mut Connection,
    schema: &Arc<NodeSchema>,
    ctx: &RequestContext,
) -> Result<NodeCommandResult> {
    let op = cmd.op_name();
    log_op_start!(
        "engine_node_command",
        command = op,
        request_id = ctx.request_id.as_str()
    );
    let start = Instant::now();

    let result = apply_node_command_impl(cmd, conn, schema).map_err(|e| {
        let mut e = e.with_op(op).with_request_id(ctx.request_id.clone());
        if let Some(trace_id) = &ctx.trace_id {
            e = e.with_trace_id(trace_id.clone());
        }
        log_op_error!(
            "engine_node_command",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64,
            command = op
        );
        e
    })?;

    log_op_end!(
        "engine_node_command",
        duration_ms = start.elapsed().as_millis() as u64,
        command = op,
        nodes_written = result.stats.nodes_written,
        nodes_deleted = result.stats.nodes_deleted
    );
    Ok(result)
}

fn apply_node_command_impl(
    cmd: Command,
    conn: &mut Connection,
    schema: &Arc<NodeSchema>,
) -> Result<NodeCommandResult> {
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(from_rusqlite)?;

    let (before, repaired) = load_tree_for_update(&tx, schema.clone())?;
    let (after, outcome) = apply(before.clone(), cmd).map_err(ExError::from)?;
    let stats = persist_tree_changes(&tx, &before, &after)?;

    for node in repaired.iter().filter_map(|id| after.find(*id)) {
        SqliteRepo::persist_node(&tx, node)?;
    }

    tx.commit().map_err(from_rusqlite)?;
    Ok(NodeCommandResult { outcome, stats })
}
