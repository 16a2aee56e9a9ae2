// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct JobConfig {
    /// Maximum time a worker may hold a task before it is marked unresponsive
    pub worker_timeout_ms: u64,
    /// Number of times a failed or timed out task is requeued before the job fails
    pub retry_budget: u32,
    /// Maximum number of input pairs per map task
    pub map_chunk_size: usize,
    /// How long local workers get to exit after terminate before they are aborted
    pub shutdown_grace_ms: u64,
    pub fault: FaultConfig,
}

/// Fault injection applied by workers before running a task
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct FaultConfig {
    /// Probability (0-100) that a worker reports a failure instead of running the task
    pub failure_probability: u32,
    /// Probability (0-100) that a worker becomes a straggler (slow)
    pub straggler_probability: u32,
    /// Maximum delay in milliseconds for a straggler
    pub straggler_delay_ms: u64,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            worker_timeout_ms: 5000,
            retry_budget: 1,
            map_chunk_size: 1,
            shutdown_grace_ms: 1000,
            fault: FaultConfig::default(),
        }
    }
}

impl Default for FaultConfig {
    fn default() -> Self {
        Self {
            failure_probability: 0,
            straggler_probability: 0,
            straggler_delay_ms: 1000,
        }
    }
}

impl JobConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: JobConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "worker_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.map_chunk_size == 0 {
            return Err(ConfigError::Invalid(
                "map_chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.fault.failure_probability > 100 || self.fault.straggler_probability > 100 {
            return Err(ConfigError::Invalid(
                "fault probabilities are percentages (0-100)".to_string(),
            ));
        }
        Ok(())
    }

    pub fn worker_timeout(&self) -> Duration {
        Duration::from_millis(self.worker_timeout_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}
