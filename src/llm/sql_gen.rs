//! Natural language to SQL statement synthesis.

use crate::llm::client::{ChatModel, ChatRequest};
use crate::types::Result;

const MAX_TOKENS: u32 = 1024;

fn system_prompt(question: &str, schema: &str, dialect: &str) -> String {
    format!(
        "You are a {dialect} expert.\n\
         You are interacting with a user who asks questions about the company database.\n\
         Based on the database schema below, write a SQL query that answers the user's question.\n\
         Do not select every column from a table; select only the few columns relevant to the question.\n\
         Also, always check which table each column belongs to.\n\
         \n\
         The database schema is as follows.\n\
         <schema> {schema} </schema>\n\
         \n\
         Write only the SQL query and nothing else.\n\
         Do not wrap the SQL query in any other text, not even backticks.\n\
         \n\
         Example:\n\
         Question: Show the names of 10 customers.\n\
         SQL Query: SELECT Name FROM Customers LIMIT 10;\n\
         \n\
         Your turn:\n\
         Question: {question}\n\
         SQL Query:"
    )
}

/// Ask the model for a single SQL statement answering `question`.
///
/// The raw response text is returned as the statement: nothing is parsed or
/// validated locally, and a malformed or multi-statement reply flows
/// through to the executor unchanged. Repeated calls for the same question
/// may legitimately return different statements.
pub async fn generate_sql(
    model: &dyn ChatModel,
    question: &str,
    schema: &str,
    dialect: &str,
) -> Result<String> {
    let system = system_prompt(question, schema, dialect);
    model
        .complete(ChatRequest {
            system: &system,
            user: question,
            max_tokens: MAX_TOKENS,
            temperature: None,
        })
        .await
}
