use std::sync::Arc;

use releaf_content::{ContentConfig, NodeSchema};
use rusqlite::Connection;

const CONFIG: &str = r#"
default_locale = "en"
node_fields_to_display = ["name"]

[content_types.Text]
columns = ["id", "text_html"]

[content_types.Book]
columns = ["id", "title", "year", "created_at", "updated_at"]
permit_attributes = ["title", "year"]
merge_node_fields = true

[content_types.Store]
columns = ["id", "title"]

[content_types.ContactFormController]
kind = "controller"

[[singleness]]
for = ["Book"]
under = ["Store"]
"#;

#[allow(dead_code)]
pub fn schema() -> Arc<NodeSchema> {
    ContentConfig::from_toml_str(CONFIG)
        .and_then(ContentConfig::into_schema)
        .expect("fixture config is valid")
}

#[allow(dead_code)]
pub fn setup_test_db() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    releaf_store::migrations::apply_migrations(&mut conn).unwrap();
    conn
}
