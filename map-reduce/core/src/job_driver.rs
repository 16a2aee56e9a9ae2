// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::config::JobConfig;
use crate::coordinator::Coordinator;
use crate::error::DriverError;
use crate::map_reduce_job::{FinalOutput, JobMessage, MapReduceJob};
use crate::stats::JobStats;
use crate::transport::Transport;
use crate::types::{Rank, COORDINATOR_RANK};
use crate::worker_loop::{WorkerLoop, WorkerSummary};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Coordinator,
    Worker,
}

impl Role {
    pub fn for_rank(rank: Rank) -> Self {
        if rank == COORDINATOR_RANK {
            Role::Coordinator
        } else {
            Role::Worker
        }
    }
}

pub enum DriverOutcome<J: MapReduceJob> {
    Coordinator {
        output: FinalOutput<J>,
        stats: JobStats,
    },
    Worker(WorkerSummary),
}

/// Entry point of every process: picks the role from the transport's rank
pub struct JobDriver<J> {
    job: Arc<J>,
    config: JobConfig,
}

impl<J> Clone for JobDriver<J> {
    fn clone(&self) -> Self {
        Self {
            job: Arc::clone(&self.job),
            config: self.config.clone(),
        }
    }
}

impl<J> JobDriver<J>
where
    J: MapReduceJob,
{
    pub fn new(job: Arc<J>, config: JobConfig) -> Self {
        Self { job, config }
    }

    /// `load_inputs` is only invoked on the coordinator
    pub async fn run<T, F>(self, transport: T, load_inputs: F) -> Result<DriverOutcome<J>, DriverError>
    where
        T: Transport<JobMessage<J>>,
        F: FnOnce() -> anyhow::Result<Vec<(J::InputKey, J::InputValue)>> + Send,
    {
        let rank = transport.self_rank();
        match Role::for_rank(rank) {
            Role::Coordinator => {
                let inputs = load_inputs().map_err(DriverError::Input)?;
                info!(
                    rank,
                    processes = transport.process_count(),
                    inputs = inputs.len(),
                    "running as coordinator"
                );
                let mut coordinator = Coordinator::<J, T>::new(transport, self.config);
                let output = coordinator.run_job(inputs).await?;
                Ok(DriverOutcome::Coordinator {
                    output,
                    stats: coordinator.stats().clone(),
                })
            }
            Role::Worker => {
                info!(rank, "running as worker");
                let summary = WorkerLoop::new(self.job, transport)
                    .with_faults(self.config.fault)
                    .serve()
                    .await?;
                Ok(DriverOutcome::Worker(summary))
            }
        }
    }
}
