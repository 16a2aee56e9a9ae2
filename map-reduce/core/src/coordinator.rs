// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::accumulator::PhaseAccumulator;
use crate::config::JobConfig;
use crate::error::JobFailure;
use crate::map_reduce_job::{FinalOutput, JobMessage, JobTask, MapReduceJob};
use crate::message::{Envelope, Message};
use crate::stats::JobStats;
use crate::task::{partition_inputs, Task, TaskKind};
use crate::task_queue::TaskQueue;
use crate::transport::{Source, Transport};
use crate::types::{Rank, TaskId};
use crate::worker_handle::WorkerHandle;
use crate::worker_pool::WorkerPool;
use std::marker::PhantomData;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

type JobQueue<J> = TaskQueue<
    <J as MapReduceJob>::InputKey,
    <J as MapReduceJob>::InputValue,
    <J as MapReduceJob>::Key,
    <J as MapReduceJob>::Value,
>;

type JobAccumulator<J> = PhaseAccumulator<<J as MapReduceJob>::Key, <J as MapReduceJob>::Value>;

/// Drives a job through the map phase, the reduce phase and termination
/// Owns the worker table and every accumulator; workers only talk to it through the transport
pub struct Coordinator<J, T> {
    transport: T,
    config: JobConfig,
    pool: WorkerPool,
    stats: JobStats,
    _job: PhantomData<fn() -> J>,
}

impl<J, T> Coordinator<J, T>
where
    J: MapReduceJob,
    T: Transport<JobMessage<J>>,
{
    pub fn new(transport: T, config: JobConfig) -> Self {
        let pool = WorkerPool::for_process_count(transport.process_count());
        Self {
            transport,
            config,
            pool,
            stats: JobStats::default(),
            _job: PhantomData,
        }
    }

    pub fn stats(&self) -> &JobStats {
        &self.stats
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Run the whole job and broadcast terminate, whatever the outcome
    pub async fn run_job(
        &mut self,
        map_inputs: Vec<(J::InputKey, J::InputValue)>,
    ) -> Result<FinalOutput<J>, JobFailure> {
        self.config.validate()?;
        if self.pool.is_empty() {
            return Err(JobFailure::NoWorkers);
        }

        let started = Instant::now();
        let outcome = self.run_phases(map_inputs).await;
        if outcome.is_err() {
            self.drain_busy().await;
        }
        self.broadcast_terminate().await;

        match &outcome {
            Ok(output) => info!(
                keys = output.len(),
                map_tasks = self.stats.map_tasks,
                reduce_tasks = self.stats.reduce_tasks,
                requeues = self.stats.requeues,
                timeouts = self.stats.timeouts,
                task_failures = self.stats.task_failures,
                stale_results = self.stats.stale_results,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "job completed"
            ),
            Err(failure) => error!(%failure, "job failed"),
        }
        outcome
    }

    async fn run_phases(
        &mut self,
        map_inputs: Vec<(J::InputKey, J::InputValue)>,
    ) -> Result<FinalOutput<J>, JobFailure> {
        let mut accumulator = JobAccumulator::<J>::new();

        let map_tasks: Vec<JobTask<J>> = partition_inputs(map_inputs, self.config.map_chunk_size)
            .into_iter()
            .enumerate()
            .map(|(id, chunk)| Task::map(id, chunk))
            .collect();
        self.stats.map_tasks = map_tasks.len();
        info!(
            tasks = map_tasks.len(),
            workers = self.pool.len(),
            "map phase started"
        );
        self.run_phase(TaskKind::Map, map_tasks, &mut accumulator)
            .await?;

        debug!(
            keys = accumulator.map_output().len(),
            "map output grouped for reduce"
        );
        let reduce_tasks: Vec<JobTask<J>> = accumulator
            .take_reduce_input()
            .into_iter()
            .enumerate()
            .map(|(id, (key, values))| Task::reduce(id, key, values))
            .collect();
        self.stats.reduce_tasks = reduce_tasks.len();
        info!(tasks = reduce_tasks.len(), "reduce phase started");
        self.run_phase(TaskKind::Reduce, reduce_tasks, &mut accumulator)
            .await?;
        debug!(
            keys = accumulator.final_output().len(),
            "reduce output collected"
        );

        Ok(accumulator.into_final_output())
    }

    /// Scheduling loop shared by both phases
    async fn run_phase(
        &mut self,
        phase: TaskKind,
        tasks: Vec<JobTask<J>>,
        accumulator: &mut JobAccumulator<J>,
    ) -> Result<(), JobFailure> {
        let timeout = self.config.worker_timeout();
        let mut queue = JobQueue::<J>::new(tasks, self.config.retry_budget);

        loop {
            self.dispatch(phase, &mut queue).await?;
            debug_assert_eq!(queue.in_flight_len(), self.pool.busy_count());

            if self.pool.busy_count() == 0 {
                match queue.front_id() {
                    // Work is left but no live worker can take it
                    Some(task_id) => {
                        warn!(%phase, pending = queue.pending_len(), "no live worker can take the remaining tasks");
                        return Err(JobFailure::WorkerPoolExhausted { task_id });
                    }
                    None => break,
                }
            }

            let wait = self
                .pool
                .earliest_deadline(timeout)
                .map(|deadline| deadline.saturating_duration_since(Instant::now()))
                .unwrap_or(timeout);

            if let Some(envelope) = self.transport.receive(Source::Any, Some(wait)).await? {
                self.handle_message(phase, envelope, &mut queue, accumulator)?;
            }

            self.sweep_overdue(&mut queue, timeout)?;
        }

        debug_assert!(queue.is_drained());
        debug!(%phase, "phase drained");
        Ok(())
    }

    /// Hand the lowest eligible task id to every idle worker, in rank order
    async fn dispatch(&mut self, phase: TaskKind, queue: &mut JobQueue<J>) -> Result<(), JobFailure> {
        let mut live = self.pool.live_ranks();

        for rank in self.pool.idle_ranks() {
            if queue.pending_len() == 0 {
                break;
            }
            let Some(task) = queue.checkout(rank, &live) else {
                continue;
            };
            let task_id = task.id;

            match self.transport.send(rank, task.into()).await {
                Ok(()) => {
                    if let Some(worker) = self.pool.get_mut(rank) {
                        worker.assign(phase, task_id, Instant::now());
                    }
                    let attempt = queue.failures(task_id).unwrap_or_default() + 1;
                    debug!(rank, task_id, %phase, attempt, "task assigned");
                }
                Err(err) => {
                    warn!(rank, task_id, error = %err, "failed to deliver task, marking worker unresponsive");
                    if let Some(worker) = self.pool.get_mut(rank) {
                        worker.mark_unresponsive();
                    }
                    live.retain(|r| *r != rank);
                    self.requeue(queue, task_id, rank)?;
                }
            }
        }
        Ok(())
    }

    fn handle_message(
        &mut self,
        phase: TaskKind,
        envelope: Envelope<JobMessage<J>>,
        queue: &mut JobQueue<J>,
        accumulator: &mut JobAccumulator<J>,
    ) -> Result<(), JobFailure> {
        let Envelope { from, message } = envelope;

        match message {
            Message::MapResult { task_id, pairs } => {
                if self.accept(from, TaskKind::Map, phase, task_id) {
                    queue.complete(task_id);
                    debug!(rank = from, task_id, pairs = pairs.len(), "map result folded");
                    accumulator.fold_map_result(pairs);
                }
            }
            Message::ReduceResult {
                task_id,
                key,
                values,
            } => {
                if self.accept(from, TaskKind::Reduce, phase, task_id) {
                    queue.complete(task_id);
                    debug!(rank = from, task_id, key = ?key, "reduce result folded");
                    accumulator.fold_reduce_result(key, values);
                }
            }
            Message::TaskFailure {
                task_id,
                kind,
                reason,
            } => {
                if self.accept(from, kind, phase, task_id) {
                    self.stats.task_failures += 1;
                    warn!(rank = from, task_id, %kind, %reason, "task failed on worker");
                    self.requeue(queue, task_id, from)?;
                }
            }
            other => {
                warn!(rank = from, kind = ?other.kind(), "ignoring unexpected message from worker");
            }
        }
        Ok(())
    }

    /// Validate that `from` owns the task and release it; anything else is a stale result
    fn accept(&mut self, from: Rank, kind: TaskKind, phase: TaskKind, task_id: TaskId) -> bool {
        let owned = kind == phase && self.pool.get(from).is_some_and(|w| w.owns(kind, task_id));
        if !owned {
            self.stats.stale_results += 1;
            warn!(rank = from, task_id, %kind, "discarding stale result");
            return false;
        }
        if let Some(worker) = self.pool.get_mut(from) {
            worker.release();
        }
        true
    }

    fn sweep_overdue(&mut self, queue: &mut JobQueue<J>, timeout: Duration) -> Result<(), JobFailure> {
        for rank in self.pool.overdue(Instant::now(), timeout) {
            let Some(task_id) = self.pool.get_mut(rank).and_then(WorkerHandle::mark_unresponsive)
            else {
                continue;
            };
            self.stats.timeouts += 1;
            warn!(
                rank,
                task_id,
                timeout_ms = timeout.as_millis() as u64,
                "worker timed out, marking unresponsive"
            );
            self.requeue(queue, task_id, rank)?;
        }
        Ok(())
    }

    fn requeue(&mut self, queue: &mut JobQueue<J>, task_id: TaskId, failed_on: Rank) -> Result<(), JobFailure> {
        if let Some(failures) = queue.requeue(task_id, failed_on)? {
            self.stats.requeues += 1;
            info!(task_id, failed_on, attempt = failures + 1, "task requeued");
        }
        Ok(())
    }

    /// After a failure, let in-flight workers answer or time out; their results are dropped
    async fn drain_busy(&mut self) {
        let timeout = self.config.worker_timeout();

        while self.pool.busy_count() > 0 {
            let wait = self
                .pool
                .earliest_deadline(timeout)
                .map(|deadline| deadline.saturating_duration_since(Instant::now()))
                .unwrap_or(timeout);

            match self.transport.receive(Source::Any, Some(wait)).await {
                Ok(Some(Envelope { from, message })) => {
                    if let Some(worker) = self.pool.get_mut(from) {
                        if worker.is_busy() && worker.current_task() == message.task_id() {
                            worker.release();
                            debug!(rank = from, "discarded result while shutting down");
                        }
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(error = %err, "receive failed while draining busy workers");
                    return;
                }
            }

            for rank in self.pool.overdue(Instant::now(), timeout) {
                if let Some(task_id) = self.pool.get_mut(rank).and_then(WorkerHandle::mark_unresponsive) {
                    self.stats.timeouts += 1;
                    warn!(rank, task_id, "worker timed out while draining");
                }
            }
        }
    }

    /// Every worker gets terminate, unresponsive ones included
    async fn broadcast_terminate(&mut self) {
        let ranks = self.pool.ranks();
        for rank in &ranks {
            let terminate: JobTask<J> = Task::terminate();
            if let Err(err) = self.transport.send(*rank, terminate.into()).await {
                warn!(rank, error = %err, "failed to send terminate");
            }
        }
        info!(workers = ranks.len(), "terminate broadcast");
    }
}
