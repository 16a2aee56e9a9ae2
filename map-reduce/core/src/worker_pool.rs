// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::types::{Rank, COORDINATOR_RANK};
use crate::worker_handle::WorkerHandle;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Table of worker handles, iterated in ascending rank order
#[derive(Debug, Clone, Default)]
pub struct WorkerPool {
    workers: BTreeMap<Rank, WorkerHandle>,
}

impl WorkerPool {
    pub fn new(ranks: impl IntoIterator<Item = Rank>) -> Self {
        Self {
            workers: ranks
                .into_iter()
                .map(|rank| (rank, WorkerHandle::new(rank)))
                .collect(),
        }
    }

    /// Every rank except the coordinator's
    pub fn for_process_count(process_count: usize) -> Self {
        Self::new((0..process_count).filter(|rank| *rank != COORDINATOR_RANK))
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    pub fn get(&self, rank: Rank) -> Option<&WorkerHandle> {
        self.workers.get(&rank)
    }

    pub fn get_mut(&mut self, rank: Rank) -> Option<&mut WorkerHandle> {
        self.workers.get_mut(&rank)
    }

    pub fn iter(&self) -> impl Iterator<Item = &WorkerHandle> {
        self.workers.values()
    }

    pub fn ranks(&self) -> Vec<Rank> {
        self.workers.keys().copied().collect()
    }

    pub fn idle_ranks(&self) -> Vec<Rank> {
        self.iter().filter(|w| w.is_idle()).map(|w| w.rank()).collect()
    }

    pub fn live_ranks(&self) -> Vec<Rank> {
        self.iter().filter(|w| w.is_live()).map(|w| w.rank()).collect()
    }

    pub fn busy_count(&self) -> usize {
        self.iter().filter(|w| w.is_busy()).count()
    }

    pub fn earliest_deadline(&self, timeout: Duration) -> Option<Instant> {
        self.iter().filter_map(|w| w.deadline(timeout)).min()
    }

    pub fn overdue(&self, now: Instant, timeout: Duration) -> Vec<Rank> {
        self.iter()
            .filter(|w| w.is_overdue(now, timeout))
            .map(|w| w.rank())
            .collect()
    }
}
