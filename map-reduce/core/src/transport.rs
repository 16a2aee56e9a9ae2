// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::error::TransportError;
use crate::message::Envelope;
use crate::types::Rank;
use async_trait::async_trait;
use std::time::Duration;

/// Which sender a receive call accepts messages from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Any,
    Rank(Rank),
}

/// Point-to-point message passing between the processes of a job
/// Implementations keep the sender rank and never reorder messages between a fixed pair
#[async_trait]
pub trait Transport<M>: Send
where
    M: Send + 'static,
{
    fn self_rank(&self) -> Rank;

    fn process_count(&self) -> usize;

    async fn send(&mut self, to: Rank, message: M) -> Result<(), TransportError>;

    /// Wait for the next message; `Ok(None)` means the timeout expired first
    async fn receive(
        &mut self,
        source: Source,
        timeout: Option<Duration>,
    ) -> Result<Option<Envelope<M>>, TransportError>;
}
