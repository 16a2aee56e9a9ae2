// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::error::JobFailure;
use crate::task::Task;
use crate::types::{Rank, TaskId};
use std::collections::{HashMap, VecDeque};

#[derive(Debug, Clone)]
struct QueuedTask<K1, V1, K2, V2> {
    task: Task<K1, V1, K2, V2>,
    failures: u32,
    failed_on: Vec<Rank>,
}

impl<K1, V1, K2, V2> QueuedTask<K1, V1, K2, V2> {
    /// Ranks that already failed a task are skipped unless every live rank has failed it
    fn eligible_for(&self, rank: Rank, live: &[Rank]) -> bool {
        !self.failed_on.contains(&rank) || live.iter().all(|r| self.failed_on.contains(r))
    }
}

/// Pending and in-flight tasks of one phase
pub struct TaskQueue<K1, V1, K2, V2> {
    pending: VecDeque<QueuedTask<K1, V1, K2, V2>>,
    in_flight: HashMap<TaskId, QueuedTask<K1, V1, K2, V2>>,
    retry_budget: u32,
}

impl<K1, V1, K2, V2> TaskQueue<K1, V1, K2, V2>
where
    K1: Clone,
    V1: Clone,
    K2: Clone,
    V2: Clone,
{
    pub fn new(mut tasks: Vec<Task<K1, V1, K2, V2>>, retry_budget: u32) -> Self {
        tasks.sort_by_key(|task| task.id);
        Self {
            pending: tasks
                .into_iter()
                .map(|task| QueuedTask {
                    task,
                    failures: 0,
                    failed_on: Vec::new(),
                })
                .collect(),
            in_flight: HashMap::new(),
            retry_budget,
        }
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_drained(&self) -> bool {
        self.pending.is_empty() && self.in_flight.is_empty()
    }

    pub fn front_id(&self) -> Option<TaskId> {
        self.pending.front().map(|queued| queued.task.id)
    }

    pub fn failures(&self, task_id: TaskId) -> Option<u32> {
        self.in_flight
            .get(&task_id)
            .or_else(|| self.pending.iter().find(|q| q.task.id == task_id))
            .map(|queued| queued.failures)
    }

    /// Move the first task `rank` may run to the in-flight set and return a copy to send
    pub fn checkout(&mut self, rank: Rank, live: &[Rank]) -> Option<Task<K1, V1, K2, V2>> {
        let position = self
            .pending
            .iter()
            .position(|queued| queued.eligible_for(rank, live))?;
        let queued = self.pending.remove(position)?;
        let task = queued.task.clone();
        self.in_flight.insert(task.id, queued);
        Some(task)
    }

    /// Drop a task whose result has been folded
    pub fn complete(&mut self, task_id: TaskId) -> bool {
        self.in_flight.remove(&task_id).is_some()
    }

    /// Put a failed task back at the front of the queue
    /// Returns the failure count, or the job failure once the retry budget is spent
    pub fn requeue(&mut self, task_id: TaskId, failed_on: Rank) -> Result<Option<u32>, JobFailure> {
        let Some(mut queued) = self.in_flight.remove(&task_id) else {
            return Ok(None);
        };
        queued.failures += 1;
        if queued.failures > self.retry_budget {
            return Err(JobFailure::WorkerPoolExhausted { task_id });
        }
        if !queued.failed_on.contains(&failed_on) {
            queued.failed_on.push(failed_on);
        }
        let failures = queued.failures;
        self.pending.push_front(queued);
        Ok(Some(failures))
    }
}
