// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

mod common;

use common::{scenario_inputs, scenario_output, spawn_workers, test_config, SumByKey};
use map_reduce_core::config::JobConfig;
use map_reduce_core::coordinator::Coordinator;
use map_reduce_core::error::JobFailure;
use map_reduce_core::map_reduce_job::{JobMessage, MapReduceJob};
use map_reduce_core::message::Message;
use map_reduce_core::transport::{Source, Transport};
use map_reduce_core::types::COORDINATOR_RANK;
use map_reduce_core::worker_handle::WorkerState;
use map_reduce_core::worker_loop::WorkerLoop;
use map_reduce_task_channels::ChannelNetwork;
use std::sync::Arc;
use std::time::Duration;

/// Chunk value 1 fails at once, anything else is slow but succeeds
struct FailFastOrSlow;

impl MapReduceJob for FailFastOrSlow {
    type InputKey = String;
    type InputValue = i64;
    type Key = String;
    type Value = i64;

    fn map(&self, input: Vec<(String, i64)>) -> anyhow::Result<Vec<(String, i64)>> {
        if input.iter().any(|(_, value)| *value == 1) {
            anyhow::bail!("chunk always fails");
        }
        std::thread::sleep(Duration::from_millis(200));
        Ok(input)
    }

    fn reduce(&self, _key: &String, values: Vec<i64>) -> anyhow::Result<Vec<i64>> {
        Ok(vec![values.iter().sum()])
    }
}

#[tokio::test]
async fn test_silent_worker_triggers_exactly_one_requeue() {
    // Arrange
    let mut transports = ChannelNetwork::build::<JobMessage<SumByKey>>(4, 16);
    let coordinator_transport = transports.remove(0);
    let mut silent = transports.remove(0);
    let job = Arc::new(SumByKey);

    let silent_job = Arc::clone(&job);
    let silent_worker = tokio::spawn(async move {
        // Swallow the first assignment, then behave
        let _ignored = silent.receive(Source::Rank(COORDINATOR_RANK), None).await;
        WorkerLoop::new(silent_job, silent).serve().await
    });
    let workers = spawn_workers(transports, &job);

    // Act
    let mut coordinator = Coordinator::<SumByKey, _>::new(coordinator_transport, test_config());
    let output = coordinator.run_job(scenario_inputs()).await.unwrap();

    // Assert
    assert_eq!(output, scenario_output());
    assert_eq!(coordinator.stats().requeues, 1);
    assert_eq!(coordinator.stats().timeouts, 1);
    assert_eq!(coordinator.stats().stale_results, 0);
    assert_eq!(
        coordinator.pool().get(1).unwrap().state(),
        WorkerState::Unresponsive
    );

    let silent_summary = silent_worker.await.unwrap().unwrap();
    assert_eq!(silent_summary.completed, 0);
    let mut completed = 0;
    for worker in workers {
        completed += worker.await.unwrap().unwrap().completed;
    }
    assert_eq!(completed, 5);
}

#[tokio::test]
async fn test_result_for_task_not_owned_is_discarded() {
    // Arrange
    let mut transports = ChannelNetwork::build::<JobMessage<SumByKey>>(3, 16);
    let coordinator_transport = transports.remove(0);
    let mut rogue = transports.remove(0);
    let job = Arc::new(SumByKey);

    let rogue_job = Arc::clone(&job);
    let rogue_worker = tokio::spawn(async move {
        let envelope = rogue
            .receive(Source::Rank(COORDINATOR_RANK), None)
            .await
            .unwrap()
            .unwrap();
        let Message::Map { task_id, pairs } = envelope.message else {
            panic!("expected a map task");
        };
        rogue
            .send(
                COORDINATOR_RANK,
                Message::MapResult {
                    task_id: task_id + 100,
                    pairs: vec![("zzz".to_string(), 99)],
                },
            )
            .await
            .unwrap();
        rogue
            .send(COORDINATOR_RANK, Message::MapResult { task_id, pairs })
            .await
            .unwrap();
        WorkerLoop::new(rogue_job, rogue).serve().await
    });
    let workers = spawn_workers(transports, &job);

    // Act
    let mut coordinator = Coordinator::<SumByKey, _>::new(coordinator_transport, test_config());
    let output = coordinator.run_job(scenario_inputs()).await.unwrap();

    // Assert
    assert_eq!(output, scenario_output());
    assert!(!output.contains_key("zzz"));
    assert_eq!(coordinator.stats().stale_results, 1);
    assert_eq!(coordinator.stats().requeues, 0);

    rogue_worker.await.unwrap().unwrap();
    for worker in workers {
        worker.await.unwrap().unwrap();
    }
}

#[tokio::test]
async fn test_all_workers_silent_fails_instead_of_hanging() {
    // Arrange
    let mut transports = ChannelNetwork::build::<JobMessage<SumByKey>>(3, 16);
    let coordinator_transport = transports.remove(0);
    let mut silent_workers = Vec::new();
    for mut transport in transports {
        silent_workers.push(tokio::spawn(async move {
            // Never answers; leaves on terminate
            loop {
                let envelope = transport
                    .receive(Source::Rank(COORDINATOR_RANK), None)
                    .await
                    .unwrap()
                    .unwrap();
                if matches!(envelope.message, Message::Terminate) {
                    break;
                }
            }
        }));
    }

    // Act
    let mut coordinator = Coordinator::<SumByKey, _>::new(coordinator_transport, test_config());
    let result = coordinator.run_job(scenario_inputs()).await;

    // Assert
    assert!(matches!(
        result,
        Err(JobFailure::WorkerPoolExhausted { .. })
    ));
    assert_eq!(coordinator.stats().timeouts, 2);
    for worker in silent_workers {
        worker.await.unwrap();
    }
}

#[tokio::test]
async fn test_busy_worker_is_drained_before_terminate_on_failure() {
    // Arrange
    let mut transports = ChannelNetwork::build::<JobMessage<FailFastOrSlow>>(3, 16);
    let coordinator_transport = transports.remove(0);
    let job = Arc::new(FailFastOrSlow);
    let workers = spawn_workers(transports, &job);
    let config = JobConfig {
        worker_timeout_ms: 2000,
        retry_budget: 0,
        ..JobConfig::default()
    };
    let inputs = vec![("a".to_string(), 1), ("b".to_string(), 2)];

    // Act
    let mut coordinator = Coordinator::<FailFastOrSlow, _>::new(coordinator_transport, config);
    let result = coordinator.run_job(inputs).await;

    // Assert
    assert!(matches!(
        result,
        Err(JobFailure::WorkerPoolExhausted { task_id: 0 })
    ));
    assert_eq!(coordinator.pool().busy_count(), 0);
    assert_eq!(coordinator.pool().get(2).unwrap().state(), WorkerState::Idle);
    assert_eq!(coordinator.stats().task_failures, 1);
    assert_eq!(coordinator.stats().timeouts, 0);

    let mut summaries = Vec::new();
    for worker in workers {
        summaries.push(worker.await.unwrap().unwrap());
    }
    // The slow worker finished its task and then left on terminate
    assert_eq!(summaries[1].rank, 2);
    assert_eq!(summaries[1].completed, 1);
    assert_eq!(summaries[0].failed, 1);
}
