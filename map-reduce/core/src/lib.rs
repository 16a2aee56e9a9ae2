// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

pub mod accumulator;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod fault;
pub mod inbox;
pub mod job_driver;
pub mod map_reduce_job;
pub mod message;
pub mod stats;
pub mod task;
pub mod task_queue;
pub mod telemetry;
pub mod transport;
pub mod types;
pub mod worker_handle;
pub mod worker_loop;
pub mod worker_pool;
