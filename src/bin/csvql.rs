//! CSV-to-database question answering pipeline.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use csvql::llm::{self, LlmClient};
use csvql::{exec, materialize, reflect};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "csvql")]
#[command(about = "Convert CSV to SQL/DB files and answer questions about the data", long_about = None)]
struct Cli {
    /// Path to the CSV file
    #[arg(long, default_value = "./data/products_test_data.csv")]
    csv: PathBuf,

    /// Path to the SQLite database file
    #[arg(long, default_value = "./data/products_test_data.db")]
    db: PathBuf,

    /// Natural language question to answer against the data
    #[arg(long, default_value = "Which 10 products have the most stock left?")]
    question: String,

    /// Hosted model identifier
    #[arg(
        long,
        env = "CSVQL_MODEL",
        default_value = "apac.anthropic.claude-3-7-sonnet-20250219-v1:0"
    )]
    model: String,

    /// Region for the Bedrock endpoint
    #[arg(long, env = "AWS_REGION", default_value = "ap-northeast-2")]
    region: String,

    /// Sample rows included per table in the textual schema
    #[arg(long, default_value_t = 2)]
    sample_rows: usize,

    /// Data rows inspected when inferring column types
    #[arg(long, default_value_t = 1)]
    sample_depth: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "csvql=info".into()))
        .init();

    let cli = Cli::parse();
    let script_path = cli.csv.with_extension("sql");

    println!("\n\n## Convert CSV to SQL and DB files ----------------------\n");
    println!("- Converting {} to SQL and DB files...", cli.csv.display());
    let report = materialize::materialize(&cli.csv, &script_path, &cli.db, cli.sample_depth)?;
    match &report.script {
        Ok(()) => println!("- SQL file created successfully: {}", script_path.display()),
        Err(error) => {
            println!("- Error creating SQL file: {}", error);
            warn!(%error, "script emission failed");
        }
    }
    match &report.database {
        Ok(()) => println!("- SQLite database created successfully: {}", cli.db.display()),
        Err(error) => {
            println!("- Error creating database: {}", error);
            warn!(%error, "database load failed");
        }
    }
    if report.all_ok() {
        println!("- All conversions completed successfully!");
    }

    println!("\n\n## SCHEMA (STRUCTURED) ----------------------\n");
    let schema = reflect::describe_database(&cli.db)?;
    println!("{}", serde_json::to_string_pretty(&schema)?);

    println!("\n\n## SCHEMA (TEXTUAL) ----------------------\n");
    let (dialect, schema_text) = reflect::render_schema(&cli.db, cli.sample_rows)?;
    println!("{}", dialect);
    println!("{}", schema_text);

    println!("\n\n## MAKE SQL QUERY ----------------------\n");
    let client = LlmClient::from_env(&cli.model, &cli.region)
        .context("configuring the hosted model client")?;
    let sql_query = llm::generate_sql(&client, &cli.question, &schema_text, &dialect).await?;
    println!("{}", sql_query);

    println!("\n\n## EXECUTE SQL QUERY ----------------------\n");
    let outcome = exec::execute_and_display(&cli.db, &sql_query);

    println!("\n\n## GENERATE RESPONSE ----------------------\n");
    let response = llm::generate_answer(&client, &cli.question, &sql_query, &outcome).await?;
    println!("\nResponse to user:");
    println!("{}", response);

    Ok(())
}
