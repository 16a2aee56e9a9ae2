// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::task::TaskKind;
use crate::types::{Rank, TaskId};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Busy,
    Unresponsive,
}

/// Assignment tracking information
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Assignment {
    kind: TaskKind,
    task_id: TaskId,
    start_time: Instant,
}

/// Coordinator-side record of one worker process
#[derive(Debug, Clone)]
pub struct WorkerHandle {
    rank: Rank,
    state: WorkerState,
    assignment: Option<Assignment>,
}

impl WorkerHandle {
    pub fn new(rank: Rank) -> Self {
        Self {
            rank,
            state: WorkerState::Idle,
            assignment: None,
        }
    }

    pub fn rank(&self) -> Rank {
        self.rank
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn current_task(&self) -> Option<TaskId> {
        self.assignment.map(|a| a.task_id)
    }

    pub fn is_idle(&self) -> bool {
        self.state == WorkerState::Idle
    }

    pub fn is_busy(&self) -> bool {
        self.state == WorkerState::Busy
    }

    /// Unresponsive workers never get another assignment
    pub fn is_live(&self) -> bool {
        self.state != WorkerState::Unresponsive
    }

    /// Idle -> Busy. Returns false if the worker cannot take a task
    pub fn assign(&mut self, kind: TaskKind, task_id: TaskId, now: Instant) -> bool {
        if !self.is_idle() {
            return false;
        }
        self.state = WorkerState::Busy;
        self.assignment = Some(Assignment {
            kind,
            task_id,
            start_time: now,
        });
        true
    }

    pub fn owns(&self, kind: TaskKind, task_id: TaskId) -> bool {
        self.is_busy()
            && self
                .assignment
                .is_some_and(|a| a.kind == kind && a.task_id == task_id)
    }

    /// Busy -> Idle, handing back the finished task id
    pub fn release(&mut self) -> Option<TaskId> {
        if !self.is_busy() {
            return None;
        }
        self.state = WorkerState::Idle;
        self.assignment.take().map(|a| a.task_id)
    }

    /// Busy/Idle -> Unresponsive, handing back the abandoned task id if any
    pub fn mark_unresponsive(&mut self) -> Option<TaskId> {
        self.state = WorkerState::Unresponsive;
        self.assignment.take().map(|a| a.task_id)
    }

    pub fn deadline(&self, timeout: Duration) -> Option<Instant> {
        match self.state {
            WorkerState::Busy => self.assignment.map(|a| a.start_time + timeout),
            _ => None,
        }
    }

    pub fn is_overdue(&self, now: Instant, timeout: Duration) -> bool {
        self.deadline(timeout).is_some_and(|deadline| now >= deadline)
    }
}
