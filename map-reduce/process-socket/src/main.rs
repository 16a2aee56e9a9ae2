// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use anyhow::{Context, Result};
use clap::Parser;
use map_reduce_core::config::JobConfig;
use map_reduce_core::job_driver::{DriverOutcome, JobDriver, Role};
use map_reduce_core::map_reduce_job::JobMessage;
use map_reduce_core::telemetry::init_tracing;
use map_reduce_process_socket::process_runtime::spawn_local_workers;
use map_reduce_process_socket::{ConnectRetry, SocketTransport};
use map_reduce_word_count::{generate_documents, read_documents, top_words, WordCount};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

/// Word count across OS processes talking over TCP
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Rank of this process; 0 is the coordinator
    #[arg(long, default_value_t = 0)]
    rank: usize,

    /// Total number of processes, coordinator included
    #[arg(long, default_value_t = 4)]
    processes: usize,

    /// Address the coordinator listens on
    #[arg(long, default_value = "127.0.0.1:7878")]
    addr: String,

    /// JSON job configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Launch the worker processes from the coordinator
    #[arg(long)]
    spawn_local: bool,

    /// How long the coordinator waits for every worker to connect
    #[arg(long, default_value_t = 10_000)]
    handshake_timeout_ms: u64,

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
    let driver = JobDriver::new(Arc::new(WordCount), config);

    tokio::select! {
        result = run(cli, driver) => result,
        _ = signal::ctrl_c() => {
            warn!("interrupted, shutting down");
            Ok(())
        }
    }
}

async fn run(cli: Cli, driver: JobDriver<WordCount>) -> Result<()> {
    match Role::for_rank(cli.rank) {
        Role::Coordinator => run_coordinator(cli, driver).await,
        Role::Worker => {
            let transport = SocketTransport::<JobMessage<WordCount>>::connect(
                &cli.addr,
                cli.rank,
                cli.processes,
                ConnectRetry::default(),
            )
            .await
            .with_context(|| format!("rank {} could not reach {}", cli.rank, cli.addr))?;
            if let DriverOutcome::Worker(summary) = driver.run(transport, || Ok(Vec::new())).await? {
                info!(
                    rank = summary.rank,
                    completed = summary.completed,
                    failed = summary.failed,
                    "worker finished"
                );
            }
            Ok(())
        }
    }
}

async fn run_coordinator(cli: Cli, driver: JobDriver<WordCount>) -> Result<()> {
    let listener = TcpListener::bind(&cli.addr)
        .await
        .with_context(|| format!("failed to listen on {}", cli.addr))?;
    let addr = listener.local_addr()?.to_string();
    info!(%addr, processes = cli.processes, "coordinator listening");

    let children = if cli.spawn_local {
        spawn_local_workers(&addr, cli.processes, cli.config.as_deref())
            .context("failed to spawn worker processes")?
    } else {
        Vec::new()
    };

    let transport = SocketTransport::<JobMessage<WordCount>>::accept_workers(
        listener,
        cli.processes,
        Duration::from_millis(cli.handshake_timeout_ms),
    )
    .await?;

    let inputs = cli.inputs;
    let generate = cli.generate;
    let start_time = Instant::now();
    let outcome = driver
        .run(transport, move || {
            if inputs.is_empty() {
                Ok(generate_documents(&mut rand::rng(), generate, 12))
            } else {
                read_documents(&inputs)
            }
        })
        .await?;

    for child in children {
        let rank = child.rank();
        if let Err(err) = child.wait().await {
            warn!(rank, error = %err, "failed to reap worker process");
        }
    }

    if let DriverOutcome::Coordinator { output, stats } = outcome {
        for (word, count) in top_words(&output, cli.top) {
            println!("{word:>20} {count}");
        }
        info!(
            distinct_words = output.len(),
            requeues = stats.requeues,
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "done"
        );
    }
    Ok(())
}
