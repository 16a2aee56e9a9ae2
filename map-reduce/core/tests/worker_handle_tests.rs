// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use map_reduce_core::task::TaskKind;
use map_reduce_core::worker_handle::{WorkerHandle, WorkerState};
use map_reduce_core::worker_pool::WorkerPool;
use std::time::{Duration, Instant};

#[test]
fn test_new_worker_is_idle_without_task() {
    // Arrange & Act
    let worker = WorkerHandle::new(3);

    // Assert
    assert_eq!(worker.rank(), 3);
    assert_eq!(worker.state(), WorkerState::Idle);
    assert_eq!(worker.current_task(), None);
}

#[test]
fn test_assign_then_release_round_trips_through_busy() {
    // Arrange
    let mut worker = WorkerHandle::new(1);

    // Act
    let assigned = worker.assign(TaskKind::Map, 7, Instant::now());
    let busy_state = worker.state();
    let owns = worker.owns(TaskKind::Map, 7);
    let released = worker.release();

    // Assert
    assert!(assigned);
    assert_eq!(busy_state, WorkerState::Busy);
    assert!(owns);
    assert_eq!(released, Some(7));
    assert_eq!(worker.state(), WorkerState::Idle);
    assert_eq!(worker.current_task(), None);
}

#[test]
fn test_busy_worker_rejects_second_assignment() {
    // Arrange
    let mut worker = WorkerHandle::new(1);
    worker.assign(TaskKind::Map, 0, Instant::now());

    // Act
    let second = worker.assign(TaskKind::Map, 1, Instant::now());

    // Assert
    assert!(!second);
    assert_eq!(worker.current_task(), Some(0));
}

#[test]
fn test_ownership_distinguishes_phase_and_task() {
    // Arrange
    let mut worker = WorkerHandle::new(2);
    worker.assign(TaskKind::Reduce, 4, Instant::now());

    // Act & Assert
    assert!(worker.owns(TaskKind::Reduce, 4));
    assert!(!worker.owns(TaskKind::Map, 4));
    assert!(!worker.owns(TaskKind::Reduce, 5));
}

#[test]
fn test_unresponsive_worker_gives_up_task_and_is_not_live() {
    // Arrange
    let mut worker = WorkerHandle::new(2);
    worker.assign(TaskKind::Map, 3, Instant::now());

    // Act
    let abandoned = worker.mark_unresponsive();

    // Assert
    assert_eq!(abandoned, Some(3));
    assert_eq!(worker.state(), WorkerState::Unresponsive);
    assert!(!worker.is_live());
    assert!(!worker.owns(TaskKind::Map, 3));
    assert!(!worker.assign(TaskKind::Map, 4, Instant::now()));
    assert_eq!(worker.release(), None);
}

#[test]
fn test_worker_is_overdue_only_after_timeout() {
    // Arrange
    let timeout = Duration::from_millis(100);
    let start = Instant::now();
    let mut worker = WorkerHandle::new(1);
    worker.assign(TaskKind::Map, 0, start);

    // Act & Assert
    assert_eq!(worker.deadline(timeout), Some(start + timeout));
    assert!(!worker.is_overdue(start + Duration::from_millis(50), timeout));
    assert!(worker.is_overdue(start + Duration::from_millis(100), timeout));
}

#[test]
fn test_pool_excludes_coordinator_rank() {
    // Arrange & Act
    let pool = WorkerPool::for_process_count(4);

    // Assert
    assert_eq!(pool.len(), 3);
    assert_eq!(pool.ranks(), vec![1, 2, 3]);
    assert_eq!(pool.idle_ranks(), vec![1, 2, 3]);
    assert!(pool.get(0).is_none());
}

#[test]
fn test_pool_tracks_busy_and_overdue_workers() {
    // Arrange
    let timeout = Duration::from_millis(100);
    let start = Instant::now();
    let mut pool = WorkerPool::for_process_count(4);
    pool.get_mut(1).unwrap().assign(TaskKind::Map, 0, start);
    pool.get_mut(3)
        .unwrap()
        .assign(TaskKind::Map, 1, start + Duration::from_millis(60));
    pool.get_mut(2).unwrap().mark_unresponsive();

    // Act
    let overdue = pool.overdue(start + Duration::from_millis(120), timeout);

    // Assert
    assert_eq!(pool.busy_count(), 2);
    assert_eq!(pool.idle_ranks(), Vec::<usize>::new());
    assert_eq!(pool.live_ranks(), vec![1, 3]);
    assert_eq!(pool.earliest_deadline(timeout), Some(start + timeout));
    assert_eq!(overdue, vec![1]);
}
