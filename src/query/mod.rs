// Read-only queries over the index

pub mod engine;
pub mod text;

pub use engine::{FindResult, FindSource, QueryEngine};
pub use text::TextMatch;
