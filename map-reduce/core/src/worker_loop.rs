// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::config::FaultConfig;
use crate::error::TransportError;
use crate::fault::InjectedFault;
use crate::map_reduce_job::{JobMessage, MapReduceJob};
use crate::message::Message;
use crate::task::TaskKind;
use crate::transport::{Source, Transport};
use crate::types::{Rank, TaskId, COORDINATOR_RANK};
use std::any::Any;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WorkerSummary {
    pub rank: Rank,
    pub completed: usize,
    pub failed: usize,
}

/// Passive executor running in every non-coordinator process
/// Holds at most one task at a time and never makes scheduling decisions
pub struct WorkerLoop<J, T> {
    job: Arc<J>,
    transport: T,
    faults: FaultConfig,
}

impl<J, T> WorkerLoop<J, T>
where
    J: MapReduceJob,
    T: Transport<JobMessage<J>>,
{
    pub fn new(job: Arc<J>, transport: T) -> Self {
        Self {
            job,
            transport,
            faults: FaultConfig::default(),
        }
    }

    pub fn with_faults(mut self, faults: FaultConfig) -> Self {
        self.faults = faults;
        self
    }

    /// Serve tasks from the coordinator until terminate arrives
    pub async fn serve(mut self) -> Result<WorkerSummary, TransportError> {
        let rank = self.transport.self_rank();
        let mut summary = WorkerSummary {
            rank,
            ..WorkerSummary::default()
        };
        debug!(rank, "worker ready");

        loop {
            let Some(envelope) = self
                .transport
                .receive(Source::Rank(COORDINATOR_RANK), None)
                .await?
            else {
                continue;
            };

            let reply = match envelope.message {
                Message::Map { task_id, pairs } => {
                    let job = Arc::clone(&self.job);
                    execute(job, &self.faults, rank, task_id, TaskKind::Map, move |job: &J| {
                        let pairs = job.map(pairs)?;
                        Ok(Message::MapResult { task_id, pairs })
                    })
                    .await
                }
                Message::Reduce {
                    task_id,
                    key,
                    values,
                } => {
                    let job = Arc::clone(&self.job);
                    execute(job, &self.faults, rank, task_id, TaskKind::Reduce, move |job: &J| {
                        let values = job.reduce(&key, values)?;
                        Ok(Message::ReduceResult {
                            task_id,
                            key,
                            values,
                        })
                    })
                    .await
                }
                Message::Terminate => {
                    info!(
                        rank,
                        completed = summary.completed,
                        failed = summary.failed,
                        "worker terminating"
                    );
                    return Ok(summary);
                }
                other => {
                    warn!(rank, kind = ?other.kind(), "ignoring unexpected message from coordinator");
                    continue;
                }
            };

            if matches!(reply, Message::TaskFailure { .. }) {
                summary.failed += 1;
            } else {
                summary.completed += 1;
            }
            self.transport.send(COORDINATOR_RANK, reply).await?;
        }
    }
}

/// Run a user function on the blocking pool, turning errors and panics into a failure reply
async fn execute<J, F>(
    job: Arc<J>,
    faults: &FaultConfig,
    rank: Rank,
    task_id: TaskId,
    kind: TaskKind,
    work: F,
) -> JobMessage<J>
where
    J: MapReduceJob,
    F: FnOnce(&J) -> anyhow::Result<JobMessage<J>> + Send + 'static,
{
    if faults.is_enabled() {
        let fault = faults.sample(&mut rand::rng());
        match fault {
            InjectedFault::Failure => {
                warn!(rank, task_id, %kind, "simulated failure");
                return failure(task_id, kind, "simulated failure".to_string());
            }
            InjectedFault::Straggle(delay) => {
                warn!(rank, task_id, delay_ms = delay.as_millis() as u64, "straggling");
                tokio::time::sleep(delay).await;
            }
            InjectedFault::None => {}
        }
    }

    match tokio::task::spawn_blocking(move || work(&job)).await {
        Ok(Ok(reply)) => {
            debug!(rank, task_id, %kind, "task finished");
            reply
        }
        Ok(Err(err)) => {
            warn!(rank, task_id, %kind, error = %err, "task failed");
            failure(task_id, kind, format!("{err:#}"))
        }
        Err(join_error) => {
            let reason = match join_error.try_into_panic() {
                Ok(payload) => panic_message(payload),
                Err(join_error) => join_error.to_string(),
            };
            warn!(rank, task_id, %kind, %reason, "task panicked");
            failure(task_id, kind, reason)
        }
    }
}

fn failure<K1, V1, K2, V2>(
    task_id: TaskId,
    kind: TaskKind,
    reason: String,
) -> Message<K1, V1, K2, V2> {
    Message::TaskFailure {
        task_id,
        kind,
        reason,
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with a non-string payload".to_string()
    }
}
