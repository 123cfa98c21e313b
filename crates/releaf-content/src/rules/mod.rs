pub mod invariants;
pub mod singleness;
pub mod validation;

pub use invariants::{check_integrity, IntegrityIssue};
pub use singleness::SinglenessRule;
pub use validation::validate_node;
