// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

#![allow(dead_code)]

use map_reduce_core::config::JobConfig;
use map_reduce_core::error::TransportError;
use map_reduce_core::map_reduce_job::{JobMessage, MapReduceJob};
use map_reduce_core::worker_loop::{WorkerLoop, WorkerSummary};
use map_reduce_task_channels::ChannelTransport;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Identity map, sum reduce
pub struct SumByKey;

impl MapReduceJob for SumByKey {
    type InputKey = String;
    type InputValue = i64;
    type Key = String;
    type Value = i64;

    fn map(&self, input: Vec<(String, i64)>) -> anyhow::Result<Vec<(String, i64)>> {
        Ok(input)
    }

    fn reduce(&self, _key: &String, values: Vec<i64>) -> anyhow::Result<Vec<i64>> {
        Ok(vec![values.iter().sum()])
    }
}

pub fn scenario_inputs() -> Vec<(String, i64)> {
    vec![
        ("a".to_string(), 1),
        ("b".to_string(), 2),
        ("a".to_string(), 3),
    ]
}

pub fn scenario_output() -> HashMap<String, Vec<i64>> {
    HashMap::from([("a".to_string(), vec![4]), ("b".to_string(), vec![2])])
}

pub fn test_config() -> JobConfig {
    JobConfig {
        worker_timeout_ms: 300,
        shutdown_grace_ms: 500,
        ..JobConfig::default()
    }
}

pub fn spawn_workers<J: MapReduceJob>(
    transports: Vec<ChannelTransport<JobMessage<J>>>,
    job: &Arc<J>,
) -> Vec<JoinHandle<Result<WorkerSummary, TransportError>>> {
    transports
        .into_iter()
        .map(|transport| tokio::spawn(WorkerLoop::new(Arc::clone(job), transport).serve()))
        .collect()
}
