use std::sync::Arc;

use releaf_content::ops::create_node;
use releaf_content::registry::{ContentTypeConfig, TypeRegistry};
use releaf_content::{NewNode, NodeId, NodeSchema, SinglenessRule, Tree};

/// Registry with three record types and one controller type
#[allow(dead_code)]
pub fn registry() -> TypeRegistry {
    TypeRegistry::builder()
        .register("Text", ContentTypeConfig::record(["id", "text_html"]))
        .and_then(|b| {
            b.register(
                "Book",
                ContentTypeConfig::record(["id", "title", "year", "created_at", "updated_at"])
                    .with_permit_attributes(["title", "year"])
                    .with_fields_to_display("edit", ["title"])
                    .merging_node_fields(),
            )
        })
        .and_then(|b| b.register("Store", ContentTypeConfig::record(["id", "title"])))
        .and_then(|b| b.register("ContactFormController", ContentTypeConfig::controller()))
        .expect("fixture registry is valid")
        .node_fields_to_display(["name"])
        .build()
}

/// One Book per Store subtree
#[allow(dead_code)]
pub fn scoped_schema() -> Arc<NodeSchema> {
    NodeSchema::new(registry())
        .with_singleness(SinglenessRule::new(["Book"]).under(["Store"]))
        .with_default_locale("en")
        .shared()
}

/// One Book in the whole tree
#[allow(dead_code)]
pub fn global_schema() -> Arc<NodeSchema> {
    NodeSchema::new(registry())
        .with_singleness(SinglenessRule::new(["Book"]))
        .shared()
}

#[allow(dead_code)]
pub fn new_tree() -> Tree {
    Tree::new(scoped_schema())
}

/// Create a node of `content_type` named `name` under `parent`
#[allow(dead_code)]
pub fn add(tree: &mut Tree, name: &str, content_type: &str, parent: Option<NodeId>) -> NodeId {
    let mut new = NewNode::new(name, content_type);
    new.parent_id = parent;
    create_node(tree, new).expect("fixture node is valid")
}

/// root(Text) -> mid(Text) -> [leaf1(Text), leaf2(Text)], plus a second root
#[allow(dead_code)]
pub struct Sample {
    pub tree: Tree,
    pub root: NodeId,
    pub mid: NodeId,
    pub leaf1: NodeId,
    pub leaf2: NodeId,
    pub other_root: NodeId,
}

#[allow(dead_code)]
pub fn sample() -> Sample {
    let mut tree = new_tree();
    let root = add(&mut tree, "Root", "Text", None);
    let mid = add(&mut tree, "Mid", "Text", Some(root));
    let leaf1 = add(&mut tree, "Leaf one", "Text", Some(mid));
    let leaf2 = add(&mut tree, "Leaf two", "Text", Some(mid));
    let other_root = add(&mut tree, "Other", "Text", None);
    Sample {
        tree,
        root,
        mid,
        leaf1,
        leaf2,
        other_root,
    }
}

/// Snapshot of every node's bounds, keyed by id
#[allow(dead_code)]
pub fn bounds_by_id(tree: &Tree) -> Vec<(NodeId, i64, i64, u32)> {
    let mut out: Vec<_> = tree
        .list_nodes()
        .into_iter()
        .map(|n| (n.id, n.lft(), n.rgt(), n.depth()))
        .collect();
    out.sort();
    out
}
