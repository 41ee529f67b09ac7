//! Interactive console front-end: a menu loop over the ingestion
//! pipeline and query engine.

use crate::engine::QueryEngine;
use crate::index::IngestionPipeline;
use anyhow::Context as _;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

/// Run the interactive menu until the user quits.
///
/// Per-request failures are printed and the loop continues; nothing here
/// takes the process down.
pub async fn run(pipeline: Arc<IngestionPipeline>, engine: Arc<QueryEngine>) -> anyhow::Result<()> {
    loop {
        let choice = select(
            "grounder",
            vec![
                "Ingest a document".to_string(),
                "Ask questions".to_string(),
                "Quit".to_string(),
            ],
        )
        .await?;

        match choice {
            0 => {
                let path = PathBuf::from(input("Document path (e.g. data/document.pdf)").await?);
                match pipeline.ingest(&path).await {
                    Ok(chunks) => println!("Ingested {chunks} chunks from {}", path.display()),
                    Err(error) => eprintln!("Ingestion failed: {error}"),
                }
            }
            1 => chat(&engine).await?,
            _ => return Ok(()),
        }
    }
}

/// Question/answer loop, terminated by an empty line or `exit`.
pub async fn chat(engine: &QueryEngine) -> anyhow::Result<()> {
    println!("Ask away (empty line or 'exit' to return to the menu).");
    loop {
        let question = input("Question").await?;
        let trimmed = question.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("exit") {
            return Ok(());
        }

        match engine.answer(trimmed).await {
            Ok(answer) => {
                println!("\n{}\n", answer.text);
                if !answer.sources.is_empty() {
                    // The engine reports one source per chunk; collapse
                    // duplicates for display.
                    let unique: BTreeSet<&str> =
                        answer.sources.iter().map(String::as_str).collect();
                    let list: Vec<&str> = unique.into_iter().collect();
                    println!("Sources: {}", list.join(", "));
                }
            }
            Err(error) => eprintln!("Query failed: {error}"),
        }
    }
}

// dialoguer prompts are blocking, so they run on the blocking pool.

async fn select(prompt: &str, items: Vec<String>) -> anyhow::Result<usize> {
    let prompt = prompt.to_string();
    tokio::task::spawn_blocking(move || {
        dialoguer::Select::new()
            .with_prompt(prompt)
            .items(&items)
            .default(0)
            .interact()
    })
    .await
    .context("prompt task failed")?
    .context("menu selection failed")
}

async fn input(prompt: &str) -> anyhow::Result<String> {
    let prompt = prompt.to_string();
    tokio::task::spawn_blocking(move || {
        dialoguer::Input::<String>::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
    })
    .await
    .context("prompt task failed")?
    .context("input prompt failed")
}
