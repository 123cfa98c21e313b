//! Apply API demonstration
//!
//! Threads a content tree through `apply()`: build a small site from a
//! TOML configuration, move and copy a subtree, then show a rejected
//! command leaving the tree untouched.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use releaf_content::queries;
use releaf_content::{apply, Command, ContentConfig, NewNode, Target, Tree};

const CONFIG: &str = r#"
[content_types.Text]
columns = ["id", "text_html"]

[content_types.Book]
columns = ["id", "title", "year"]

[content_types.Store]
columns = ["id", "title"]

[[singleness]]
for = ["Book"]
under = ["Store"]
"#;

fn print_tree(tree: &Tree) {
    for node in tree.list_nodes() {
        println!(
            "{}{} [{}..{}] slug={}",
            "  ".repeat(node.depth() as usize),
            node,
            node.lft(),
            node.rgt(),
            node.slug
        );
    }
    println!();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Releaf Apply API Demo ===\n");

    let schema = ContentConfig::from_toml_str(CONFIG)?.into_schema()?;
    let state = Tree::new(schema);

    let (state, home) = apply(state, Command::NodeCreate(NewNode::new("Home", "Text")))?;
    let home = home.node_id().expect("created");
    let (state, shop) = apply(
        state,
        Command::NodeCreate(NewNode::new("Shop", "Store").under(home)),
    )?;
    let shop = shop.node_id().expect("created");
    let (state, _) = apply(
        state,
        Command::NodeCreate(
            NewNode::new("Dune", "Book")
                .under(shop)
                .with_attribute("title", "Dune"),
        ),
    )?;
    println!("## Initial tree\n");
    print_tree(&state);

    let (state, _) = apply(
        state,
        Command::NodeMove {
            node_id: shop,
            target: Target::Root,
        },
    )?;
    let (state, copy) = apply(
        state,
        Command::NodeCopy {
            node_id: shop,
            target: Target::Root,
        },
    )?;
    println!("## After moving Shop to the root and copying it\n");
    print_tree(&state);

    let copy = copy.node_id().expect("copied");
    println!(
        "Types allowed under the copy: {:?}\n",
        queries::valid_node_content_classes(&state, Some(copy))
    );

    let rejected = apply(
        state.clone(),
        Command::NodeCreate(NewNode::new("Second book", "Book").under(copy)),
    );
    match rejected {
        Ok(_) => println!("unexpected: second Book accepted"),
        Err(e) => println!("Rejected as expected: {}", e),
    }
    println!("Tree still has {} nodes", state.len());

    Ok(())
}
