//! Natural language answer synthesis from an executed query.

use crate::llm::client::{ChatModel, ChatRequest};
use crate::render;
use crate::types::{QueryOutcome, Result};

const MAX_TOKENS: u32 = 2048;
const TEMPERATURE: f32 = 0.7;

/// Render the outcome the way the answer prompt embeds it: formatted rows,
/// or the failure text as-is.
fn render_outcome(outcome: &QueryOutcome) -> String {
    match outcome {
        QueryOutcome::Rows(set) => render::format_table(set),
        QueryOutcome::Failed(message) => message.clone(),
    }
}

fn user_prompt(question: &str, sql: &str, result_text: &str) -> String {
    format!(
        "You are a database expert and a helpful assistant.\n\
         Based on the result of the SQL query executed for the user's question, \
         provide a natural language answer.\n\
         Keep technical terms to a minimum and explain in a way an ordinary user can understand.\n\
         If there is an insight or an interesting point related to the user's question, \
         mention it as well.\n\
         \n\
         Generate the response from the following information:\n\
         \n\
         User question: {question}\n\
         Executed SQL query: {sql}\n\
         Query result:\n\
         {result_text}\n\
         \n\
         Answer in a natural conversational tone, without including the SQL query \
         or technical details."
    )
}

/// Ask the model for a conversational answer grounded in the executed
/// query. The response text is returned verbatim.
pub async fn generate_answer(
    model: &dyn ChatModel,
    question: &str,
    sql: &str,
    outcome: &QueryOutcome,
) -> Result<String> {
    let result_text = render_outcome(outcome);
    let user = user_prompt(question, sql, &result_text);
    model
        .complete(ChatRequest {
            system: "Generate an answer to the user's question.",
            user: &user,
            max_tokens: MAX_TOKENS,
            temperature: Some(TEMPERATURE),
        })
        .await
}
