// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

/// Identity of a process in the job; rank 0 is the coordinator
pub type Rank = usize;

/// Sequence number of a task, unique within its phase
pub type TaskId = usize;

pub const COORDINATOR_RANK: Rank = 0;
