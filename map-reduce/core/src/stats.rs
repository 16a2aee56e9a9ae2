// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

/// Counters collected by the coordinator over one job
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct JobStats {
    pub map_tasks: usize,
    pub reduce_tasks: usize,
    pub requeues: usize,
    pub timeouts: usize,
    pub task_failures: usize,
    pub stale_results: usize,
}
