//! SQLite repository for nodes, content objects and settings
//!
//! Every function takes a `&Connection`; a `rusqlite::Transaction`
//! derefs to one, so the same calls run inside the engine's transaction.

use chrono::{DateTime, Utc};
use releaf_content::model::{ContentId, ContentObject, NestedBounds, Node, NodeId};
use rusqlite::{Connection, OptionalExtension, Row};
use serde_json::{Map, Value};

use crate::errors::{corrupt_value, from_rusqlite, Result};

/// Settings key of the tree's last-updated timestamp
pub const NODES_UPDATED_AT: &str = "nodes.updated_at";

/// A node as stored, with its persisted nested-set bounds
pub type NodeRow = (Node, NestedBounds);

const NODE_COLUMNS: &str = "id, parent_id, name, slug, content_type, content_id, locale, active, \
                            lft, rgt, depth, created_at, updated_at";

const CONTENT_COLUMNS: &str = "id, content_type, attributes, created_at, updated_at";

pub struct SqliteRepo;

impl SqliteRepo {
    /// Insert or update a node row
    pub fn persist_node(conn: &Connection, node: &Node) -> Result<()> {
        let bounds = node.bounds();
        conn.execute(
            "INSERT INTO nodes (id, parent_id, name, slug, content_type, content_id, locale, active,
                                lft, rgt, depth, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
             ON CONFLICT(id) DO UPDATE SET
                parent_id = excluded.parent_id,
                name = excluded.name,
                slug = excluded.slug,
                content_type = excluded.content_type,
                content_id = excluded.content_id,
                locale = excluded.locale,
                active = excluded.active,
                lft = excluded.lft,
                rgt = excluded.rgt,
                depth = excluded.depth,
                updated_at = excluded.updated_at",
            rusqlite::params![
                node.id.get(),
                node.parent_id.map(NodeId::get),
                node.name,
                node.slug,
                node.content_type,
                node.content_id.map(|c| c.0),
                node.locale,
                node.active,
                bounds.lft,
                bounds.rgt,
                bounds.depth,
                node.created_at.timestamp_millis(),
                node.updated_at.timestamp_millis(),
            ],
        )
        .map_err(from_rusqlite)?;
        Ok(())
    }

    /// Returns whether a row was deleted
    pub fn delete_node(conn: &Connection, id: NodeId) -> Result<bool> {
        let deleted = conn
            .execute("DELETE FROM nodes WHERE id = ?1", [id.get()])
            .map_err(from_rusqlite)?;
        Ok(deleted > 0)
    }

    pub fn get_node(conn: &Connection, id: NodeId) -> Result<Option<NodeRow>> {
        let sql = format!("SELECT {} FROM nodes WHERE id = ?1", NODE_COLUMNS);
        let raw = conn
            .query_row(&sql, [id.get()], RawNode::from_row)
            .optional()
            .map_err(from_rusqlite)?;
        raw.map(RawNode::into_row).transpose()
    }

    /// All nodes in nested-set order
    pub fn list_nodes(conn: &Connection) -> Result<Vec<NodeRow>> {
        let sql = format!("SELECT {} FROM nodes ORDER BY lft, id", NODE_COLUMNS);
        let mut stmt = conn.prepare(&sql).map_err(from_rusqlite)?;
        let raws = stmt
            .query_map([], RawNode::from_row)
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;
        raws.into_iter().map(RawNode::into_row).collect()
    }

    pub fn count_nodes(conn: &Connection) -> Result<usize> {
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM nodes", [], |row| row.get(0))
            .map_err(from_rusqlite)?;
        Ok(count.max(0) as usize)
    }

    /// Insert or update a content object
    pub fn persist_content(conn: &Connection, content: &ContentObject) -> Result<()> {
        let attributes = Value::Object(content.attributes.clone()).to_string();
        conn.execute(
            "INSERT INTO contents (id, content_type, attributes, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                content_type = excluded.content_type,
                attributes = excluded.attributes,
                updated_at = excluded.updated_at",
            rusqlite::params![
                content.id.0,
                content.content_type,
                attributes,
                content.created_at.timestamp_millis(),
                content.updated_at.timestamp_millis(),
            ],
        )
        .map_err(from_rusqlite)?;
        Ok(())
    }

    /// Returns whether a row was deleted
    pub fn delete_content(conn: &Connection, id: ContentId) -> Result<bool> {
        let deleted = conn
            .execute("DELETE FROM contents WHERE id = ?1", [id.0])
            .map_err(from_rusqlite)?;
        Ok(deleted > 0)
    }

    pub fn get_content(conn: &Connection, id: ContentId) -> Result<Option<ContentObject>> {
        let sql = format!("SELECT {} FROM contents WHERE id = ?1", CONTENT_COLUMNS);
        let raw = conn
            .query_row(&sql, [id.0], RawContent::from_row)
            .optional()
            .map_err(from_rusqlite)?;
        raw.map(RawContent::into_content).transpose()
    }

    pub fn list_contents(conn: &Connection) -> Result<Vec<ContentObject>> {
        let sql = format!("SELECT {} FROM contents ORDER BY id", CONTENT_COLUMNS);
        let mut stmt = conn.prepare(&sql).map_err(from_rusqlite)?;
        let raws = stmt
            .query_map([], RawContent::from_row)
            .map_err(from_rusqlite)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(from_rusqlite)?;
        raws.into_iter().map(RawContent::into_content).collect()
    }

    pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
        conn.query_row("SELECT value FROM settings WHERE key = ?1", [key], |row| {
            row.get(0)
        })
        .optional()
        .map_err(from_rusqlite)
    }

    pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
        conn.execute(
            "INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            rusqlite::params![key, value, Utc::now().timestamp_millis()],
        )
        .map_err(from_rusqlite)?;
        Ok(())
    }

    /// Last time any node changed, stored as epoch milliseconds
    pub fn get_nodes_updated_at(conn: &Connection) -> Result<Option<DateTime<Utc>>> {
        let Some(raw) = Self::get_setting(conn, NODES_UPDATED_AT)? else {
            return Ok(None);
        };
        let millis: i64 = raw
            .parse()
            .map_err(|e| corrupt_value("settings.value", NODES_UPDATED_AT, e))?;
        timestamp("settings.value", NODES_UPDATED_AT, millis).map(Some)
    }

    pub fn set_nodes_updated_at(conn: &Connection, at: DateTime<Utc>) -> Result<()> {
        Self::set_setting(conn, NODES_UPDATED_AT, &at.timestamp_millis().to_string())
    }
}

/// Column values of a `nodes` row before conversion
struct RawNode {
    id: i64,
    parent_id: Option<i64>,
    name: String,
    slug: String,
    content_type: Option<String>,
    content_id: Option<i64>,
    locale: Option<String>,
    active: bool,
    lft: i64,
    rgt: i64,
    depth: u32,
    created_at: i64,
    updated_at: i64,
}

impl RawNode {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            parent_id: row.get(1)?,
            name: row.get(2)?,
            slug: row.get(3)?,
            content_type: row.get(4)?,
            content_id: row.get(5)?,
            locale: row.get(6)?,
            active: row.get(7)?,
            lft: row.get(8)?,
            rgt: row.get(9)?,
            depth: row.get(10)?,
            created_at: row.get(11)?,
            updated_at: row.get(12)?,
        })
    }

    fn into_row(self) -> Result<NodeRow> {
        let mut node = Node::new(NodeId(self.id), self.name);
        node.parent_id = self.parent_id.map(NodeId);
        node.slug = self.slug;
        node.content_type = self.content_type;
        node.content_id = self.content_id.map(ContentId);
        node.locale = self.locale;
        node.active = self.active;
        node.created_at = timestamp("nodes.created_at", self.id, self.created_at)?;
        node.updated_at = timestamp("nodes.updated_at", self.id, self.updated_at)?;
        let bounds = NestedBounds {
            lft: self.lft,
            rgt: self.rgt,
            depth: self.depth,
        };
        Ok((node, bounds))
    }
}

struct RawContent {
    id: i64,
    content_type: String,
    attributes: String,
    created_at: i64,
    updated_at: i64,
}

impl RawContent {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            content_type: row.get(1)?,
            attributes: row.get(2)?,
            created_at: row.get(3)?,
            updated_at: row.get(4)?,
        })
    }

    fn into_content(self) -> Result<ContentObject> {
        let attributes: Map<String, Value> = serde_json::from_str(&self.attributes)
            .map_err(|e| corrupt_value("contents.attributes", self.id, e))?;
        let mut content = ContentObject::new(ContentId(self.id), self.content_type, attributes);
        content.created_at = timestamp("contents.created_at", self.id, self.created_at)?;
        content.updated_at = timestamp("contents.updated_at", self.id, self.updated_at)?;
        Ok(content)
    }
}

fn timestamp(column: &str, entity_id: impl ToString, millis: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| corrupt_value(column, entity_id, format!("{} out of range", millis)))
}
