// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

mod common;

use common::{scenario_inputs, scenario_output, test_config, SumByKey};
use map_reduce_core::config::JobConfig;
use map_reduce_core::error::{DriverError, JobFailure};
use map_reduce_core::job_driver::{DriverOutcome, JobDriver, Role};
use map_reduce_core::map_reduce_job::JobMessage;
use map_reduce_task_channels::ChannelNetwork;
use std::sync::Arc;

#[test]
fn test_rank_zero_is_the_coordinator() {
    // Arrange & Act & Assert
    assert_eq!(Role::for_rank(0), Role::Coordinator);
    assert_eq!(Role::for_rank(1), Role::Worker);
    assert_eq!(Role::for_rank(17), Role::Worker);
}

#[tokio::test]
async fn test_every_rank_runs_through_the_driver() {
    // Arrange
    let driver = JobDriver::new(Arc::new(SumByKey), test_config());
    let transports = ChannelNetwork::build::<JobMessage<SumByKey>>(4, 16);

    // Act
    let handles: Vec<_> = transports
        .into_iter()
        .map(|transport| {
            let driver = driver.clone();
            tokio::spawn(async move { driver.run(transport, || Ok(scenario_inputs())).await })
        })
        .collect();
    let mut outcomes = Vec::new();
    for handle in handles {
        outcomes.push(handle.await.unwrap().unwrap());
    }

    // Assert
    let mut worker_tasks = 0;
    let mut coordinators = 0;
    for outcome in outcomes {
        match outcome {
            DriverOutcome::Coordinator { output, stats } => {
                coordinators += 1;
                assert_eq!(output, scenario_output());
                assert_eq!(stats.map_tasks, 3);
            }
            DriverOutcome::Worker(summary) => {
                assert_ne!(summary.rank, 0);
                assert_eq!(summary.failed, 0);
                worker_tasks += summary.completed;
            }
        }
    }
    assert_eq!(coordinators, 1);
    assert_eq!(worker_tasks, 5);
}

#[tokio::test]
async fn test_input_errors_surface_on_the_coordinator() {
    // Arrange
    let driver = JobDriver::new(Arc::new(SumByKey), test_config());
    let mut transports = ChannelNetwork::build::<JobMessage<SumByKey>>(2, 16);
    let coordinator_transport = transports.remove(0);

    // Act
    let result = driver
        .run(coordinator_transport, || anyhow::bail!("input missing"))
        .await;

    // Assert
    assert!(matches!(result, Err(DriverError::Input(_))));
}

#[tokio::test]
async fn test_coordinator_rejects_invalid_config() {
    // Arrange
    let config = JobConfig {
        worker_timeout_ms: 0,
        ..test_config()
    };
    let driver = JobDriver::new(Arc::new(SumByKey), config);
    let mut transports = ChannelNetwork::build::<JobMessage<SumByKey>>(2, 16);
    let coordinator_transport = transports.remove(0);

    // Act
    let result = driver
        .run(coordinator_transport, || Ok(scenario_inputs()))
        .await;

    // Assert
    assert!(matches!(
        result,
        Err(DriverError::Job(JobFailure::InvalidConfig(_)))
    ));
}
