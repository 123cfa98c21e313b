use std::sync::Arc;

use releaf_content::registry::{ContentTypeConfig, TypeRegistry};
use releaf_content::{NodeSchema, SinglenessRule};
use rusqlite::Connection;

/// Text and Book record types plus a controller type
#[allow(dead_code)]
pub fn schema() -> Arc<NodeSchema> {
    let registry = TypeRegistry::builder()
        .register("Text", ContentTypeConfig::record(["id", "text_html"]))
        .and_then(|b| b.register("Book", ContentTypeConfig::record(["id", "title", "year"])))
        .and_then(|b| b.register("ContactFormController", ContentTypeConfig::controller()))
        .expect("fixture registry is valid")
        .build();
    NodeSchema::new(registry)
        .with_singleness(SinglenessRule::new(["Book"]))
        .shared()
}

#[allow(dead_code)]
pub fn setup_test_db() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    releaf_store::migrations::apply_migrations(&mut conn).unwrap();
    conn
}
