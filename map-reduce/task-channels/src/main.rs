// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use anyhow::{Context, Result};
use clap::Parser;
use map_reduce_core::config::JobConfig;
use map_reduce_core::telemetry::init_tracing;
use map_reduce_task_channels::run_job;
use map_reduce_word_count::{generate_documents, read_documents, top_words, WordCount};
use std::path::PathBuf;
use std::time::Instant;
use tokio::signal;
use tracing::{info, warn};

/// Word count over tokio tasks connected by in-memory channels
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Number of worker tasks
    #[arg(long, default_value_t = 4)]
    workers: usize,

    /// JSON job configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Lines of random text to generate when no input file is given
    #[arg(long, default_value_t = 1000)]
    generate: usize,

    /// Number of words to print
    #[arg(long, default_value_t = 10)]
    top: usize,

    /// Text files to count words in
    inputs: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("info");
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => JobConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => JobConfig::default(),
    };

    let documents = if cli.inputs.is_empty() {
        generate_documents(&mut rand::rng(), cli.generate, 12)
    } else {
        read_documents(&cli.inputs)?
    };
    info!(
        lines = documents.len(),
        workers = cli.workers,
        "starting word count"
    );

    let start_time = Instant::now();
    let output = tokio::select! {
        result = run_job(WordCount, documents, cli.workers, config) => result?,
        _ = signal::ctrl_c() => {
            warn!("interrupted, abandoning job");
            return Ok(());
        }
    };

    for (word, count) in top_words(&output.results, cli.top) {
        println!("{word:>20} {count}");
    }
    info!(
        distinct_words = output.results.len(),
        requeues = output.stats.requeues,
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "done"
    );
    Ok(())
}
