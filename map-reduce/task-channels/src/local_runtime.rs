// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::channel_transport::ChannelNetwork;
use map_reduce_core::config::JobConfig;
use map_reduce_core::coordinator::Coordinator;
use map_reduce_core::error::{DriverError, JobFailure};
use map_reduce_core::job_driver::{DriverOutcome, JobDriver};
use map_reduce_core::map_reduce_job::{FinalOutput, JobMessage, MapReduceJob};
use map_reduce_core::stats::JobStats;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, warn};

/// Per-pair channel capacity; a worker never holds more than one task and a terminate
const CHANNEL_BUFFER: usize = 16;

pub struct JobOutput<J: MapReduceJob> {
    pub results: FinalOutput<J>,
    pub stats: JobStats,
}

/// Run a job on `worker_count` tokio tasks plus a coordinator, all in this process
pub async fn run_job<J>(
    job: J,
    map_inputs: Vec<(J::InputKey, J::InputValue)>,
    worker_count: usize,
    config: JobConfig,
) -> Result<JobOutput<J>, JobFailure>
where
    J: MapReduceJob,
{
    config.validate()?;
    if worker_count == 0 {
        return Err(JobFailure::NoWorkers);
    }

    let driver = JobDriver::new(Arc::new(job), config.clone());
    let mut transports = ChannelNetwork::build::<JobMessage<J>>(worker_count + 1, CHANNEL_BUFFER);
    let coordinator_transport = transports.remove(0);

    let workers: Vec<JoinHandle<Result<DriverOutcome<J>, DriverError>>> = transports
        .into_iter()
        .map(|transport| {
            let driver = driver.clone();
            tokio::spawn(async move { driver.run(transport, || Ok(Vec::new())).await })
        })
        .collect();

    let mut coordinator = Coordinator::<J, _>::new(coordinator_transport, config.clone());
    let outcome = coordinator.run_job(map_inputs).await;

    join_workers(workers, config.shutdown_grace()).await;

    outcome.map(|results| JobOutput {
        results,
        stats: coordinator.stats().clone(),
    })
}

/// Wait for workers to leave after terminate; stragglers past the grace period are aborted
async fn join_workers<J: MapReduceJob>(
    workers: Vec<JoinHandle<Result<DriverOutcome<J>, DriverError>>>,
    grace: std::time::Duration,
) {
    let deadline = Instant::now() + grace;
    for mut handle in workers {
        match timeout_at(deadline, &mut handle).await {
            Ok(Ok(Ok(DriverOutcome::Worker(summary)))) => {
                debug!(
                    rank = summary.rank,
                    completed = summary.completed,
                    failed = summary.failed,
                    "worker finished"
                );
            }
            Ok(Ok(Ok(DriverOutcome::Coordinator { .. }))) => {}
            Ok(Ok(Err(err))) => warn!(error = %err, "worker stopped with an error"),
            Ok(Err(join_error)) => warn!(error = %join_error, "worker task failed"),
            Err(_) => {
                warn!("worker did not stop within the grace period, aborting");
                handle.abort();
            }
        }
    }
}
