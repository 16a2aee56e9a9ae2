// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use map_reduce_core::error::TransportError;
use map_reduce_core::transport::{Source, Transport};
use map_reduce_task_channels::ChannelNetwork;
use std::time::Duration;

#[tokio::test]
async fn test_network_assigns_ranks_in_order() {
    // Arrange & Act
    let transports = ChannelNetwork::build::<u32>(3, 4);

    // Assert
    let ranks: Vec<usize> = transports.iter().map(|t| t.self_rank()).collect();
    assert_eq!(ranks, vec![0, 1, 2]);
    assert!(transports.iter().all(|t| t.process_count() == 3));
}

#[tokio::test]
async fn test_message_carries_sender_rank() {
    // Arrange
    let mut transports = ChannelNetwork::build::<u32>(3, 4);
    let mut worker = transports.remove(2);
    let mut coordinator = transports.remove(0);

    // Act
    worker.send(0, 42).await.unwrap();
    let envelope = coordinator
        .receive(Source::Any, Some(Duration::from_millis(100)))
        .await
        .unwrap()
        .unwrap();

    // Assert
    assert_eq!(envelope.from, 2);
    assert_eq!(envelope.message, 42);
}

#[tokio::test]
async fn test_receive_times_out_when_nothing_is_sent() {
    // Arrange
    let mut transports = ChannelNetwork::build::<u32>(2, 4);

    // Act
    let received = transports[0]
        .receive(Source::Any, Some(Duration::from_millis(20)))
        .await
        .unwrap();

    // Assert
    assert!(received.is_none());
}

#[tokio::test]
async fn test_send_to_unknown_rank_fails() {
    // Arrange
    let mut transports = ChannelNetwork::build::<u32>(2, 4);

    // Act
    let result = transports[0].send(5, 1).await;

    // Assert
    assert!(matches!(result, Err(TransportError::UnknownRank(5))));
}

#[tokio::test]
async fn test_send_to_dropped_peer_reports_disconnect() {
    // Arrange
    let mut transports = ChannelNetwork::build::<u32>(2, 4);
    drop(transports.pop());

    // Act
    let result = transports[0].send(1, 7).await;

    // Assert
    assert!(matches!(result, Err(TransportError::Disconnected(1))));
}
