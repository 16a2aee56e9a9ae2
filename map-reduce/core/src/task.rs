// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::types::TaskId;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    Map,
    Reduce,
    Terminate,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::Map => write!(f, "map"),
            TaskKind::Reduce => write!(f, "reduce"),
            TaskKind::Terminate => write!(f, "terminate"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TaskPayload<K1, V1, K2, V2> {
    Map(Vec<(K1, V1)>),
    Reduce { key: K2, values: Vec<V2> },
    Terminate,
}

/// Unit of work owned by the coordinator until it is assigned
#[derive(Debug, Clone, PartialEq)]
pub struct Task<K1, V1, K2, V2> {
    pub id: TaskId,
    pub payload: TaskPayload<K1, V1, K2, V2>,
}

impl<K1, V1, K2, V2> Task<K1, V1, K2, V2> {
    pub fn map(id: TaskId, pairs: Vec<(K1, V1)>) -> Self {
        Self {
            id,
            payload: TaskPayload::Map(pairs),
        }
    }

    pub fn reduce(id: TaskId, key: K2, values: Vec<V2>) -> Self {
        Self {
            id,
            payload: TaskPayload::Reduce { key, values },
        }
    }

    pub fn terminate() -> Self {
        Self {
            id: 0,
            payload: TaskPayload::Terminate,
        }
    }

    pub fn kind(&self) -> TaskKind {
        match self.payload {
            TaskPayload::Map(_) => TaskKind::Map,
            TaskPayload::Reduce { .. } => TaskKind::Reduce,
            TaskPayload::Terminate => TaskKind::Terminate,
        }
    }
}

/// Split map input into consecutive chunks of at most `chunk_size` pairs
/// The chunk count depends only on the input length, never on the worker pool
pub fn partition_inputs<K, V>(inputs: Vec<(K, V)>, chunk_size: usize) -> Vec<Vec<(K, V)>> {
    let chunk_size = chunk_size.max(1);
    let mut chunks = Vec::with_capacity(inputs.len().div_ceil(chunk_size));
    let mut pairs = inputs.into_iter().peekable();
    while pairs.peek().is_some() {
        chunks.push(pairs.by_ref().take(chunk_size).collect());
    }
    chunks
}
