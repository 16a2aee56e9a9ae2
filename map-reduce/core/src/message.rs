// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::task::{Task, TaskKind, TaskPayload};
use crate::types::{Rank, TaskId};
use serde::{Deserialize, Serialize};

/// Messages exchanged between the coordinator and workers
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum Message<K1, V1, K2, V2> {
    Map {
        task_id: TaskId,
        pairs: Vec<(K1, V1)>,
    },
    Reduce {
        task_id: TaskId,
        key: K2,
        values: Vec<V2>,
    },
    Terminate,
    MapResult {
        task_id: TaskId,
        pairs: Vec<(K2, V2)>,
    },
    ReduceResult {
        task_id: TaskId,
        key: K2,
        values: Vec<V2>,
    },
    /// The user function failed or panicked while running the task
    TaskFailure {
        task_id: TaskId,
        kind: TaskKind,
        reason: String,
    },
}

/// Logical kind of a message, independent of its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Map,
    Reduce,
    Terminate,
    Result,
    TaskFailure,
}

impl<K1, V1, K2, V2> Message<K1, V1, K2, V2> {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Map { .. } => MessageKind::Map,
            Message::Reduce { .. } => MessageKind::Reduce,
            Message::Terminate => MessageKind::Terminate,
            Message::MapResult { .. } | Message::ReduceResult { .. } => MessageKind::Result,
            Message::TaskFailure { .. } => MessageKind::TaskFailure,
        }
    }

    pub fn task_id(&self) -> Option<TaskId> {
        match self {
            Message::Map { task_id, .. }
            | Message::Reduce { task_id, .. }
            | Message::MapResult { task_id, .. }
            | Message::ReduceResult { task_id, .. }
            | Message::TaskFailure { task_id, .. } => Some(*task_id),
            Message::Terminate => None,
        }
    }
}

impl<K1, V1, K2, V2> From<Task<K1, V1, K2, V2>> for Message<K1, V1, K2, V2> {
    fn from(task: Task<K1, V1, K2, V2>) -> Self {
        let task_id = task.id;
        match task.payload {
            TaskPayload::Map(pairs) => Message::Map { task_id, pairs },
            TaskPayload::Reduce { key, values } => Message::Reduce {
                task_id,
                key,
                values,
            },
            TaskPayload::Terminate => Message::Terminate,
        }
    }
}

/// A received message together with the rank that sent it
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope<M> {
    pub from: Rank,
    pub message: M,
}
