// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::types::{Rank, TaskId};
use thiserror::Error;

/// Failures of the message passing layer
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("rank {0} is not reachable from this process")]
    UnknownRank(Rank),

    #[error("channel to rank {0} is closed")]
    Disconnected(Rank),

    #[error("every inbound channel is closed")]
    Closed,

    #[error("handshake failed: {0}")]
    Handshake(String),

    #[error("frame of {0} bytes exceeds the frame limit")]
    FrameTooLarge(usize),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Fatal outcome of a job
#[derive(Debug, Error)]
pub enum JobFailure {
    #[error("a job needs at least one worker process")]
    NoWorkers,

    #[error("worker pool exhausted while running task {task_id}")]
    WorkerPoolExhausted { task_id: TaskId },

    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Errors surfaced by the job driver, whichever role the process plays
#[derive(Debug, Error)]
pub enum DriverError {
    #[error(transparent)]
    Job(#[from] JobFailure),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("failed to load job input: {0:#}")]
    Input(anyhow::Error),
}
