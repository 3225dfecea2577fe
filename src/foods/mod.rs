pub mod repo;
pub mod repo_types;
pub mod tree;

pub use repo_types::{Food, FoodCategory};
pub use tree::CategoryTree;
