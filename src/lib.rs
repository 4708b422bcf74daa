//! csvql - CSV to SQLite conversion with LLM-backed question answering.
//!
//! A linear pipeline: load a delimited file, materialize it as a SQLite
//! table and an equivalent SQL script, reflect the resulting schema, have a
//! hosted model synthesize a query for a natural-language question, execute
//! it, and have the model summarize the result.

pub mod exec;
pub mod llm;
pub mod loader;
pub mod materialize;
pub mod reflect;
pub mod render;
pub mod types;

// Re-export main types
pub use llm::{ChatModel, ChatRequest, LlmClient};
pub use materialize::MaterializeReport;
pub use reflect::SchemaDescription;
pub use types::{ColumnType, Error, QueryOutcome, Result, ResultSet, TabularDataset};
