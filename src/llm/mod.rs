//! Hosted chat-completion client and the two synthesis stages.

pub mod answer;
pub mod client;
pub mod sql_gen;

pub use answer::generate_answer;
pub use client::{ChatModel, ChatRequest, LlmClient, Provider};
pub use sql_gen::generate_sql;
