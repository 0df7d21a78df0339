//! Smoke harness: runs a few known-good queries against the live store and
//! prints the answers. Needs real `GEMINI_API_KEY` / `STORE_ID` values.

use std::env;

use anyhow::{bail, Context};

use flusso_backend::engine::QueryEngine;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let api_key = env::var("GEMINI_API_KEY").unwrap_or_default();
    if api_key.is_empty() {
        bail!("GEMINI_API_KEY environment variable not set");
    }
    let store_id = env::var("STORE_ID").unwrap_or_default();

    let engine = QueryEngine::new(&api_key, &store_id).context("Failed to build query engine")?;

    let test_queries = [
        "What products does Flusso offer?",
        "Tell me about product 100.1000",
        "What finishes are available for kitchen faucets?",
    ];

    for query in test_queries {
        println!("\n{}", "=".repeat(70));
        println!("Query: {query}");
        println!("{}", "=".repeat(70));

        let result = engine.ask(query, None, None).await?;

        if result.success {
            println!("\nAnswer:\n{}\n", result.answer.as_deref().unwrap_or_default());
            if !result.sources.is_empty() {
                println!("Sources ({}):", result.source_count);
                for (i, source) in result.sources.iter().take(5).enumerate() {
                    println!("  {}. {}", i + 1, source.title);
                }
            }
        } else {
            println!(
                "\nError: {}",
                result.error.as_deref().unwrap_or("Unknown error")
            );
        }
    }

    Ok(())
}
