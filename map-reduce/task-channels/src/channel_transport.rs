// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use async_trait::async_trait;
use map_reduce_core::error::TransportError;
use map_reduce_core::inbox::Inbox;
use map_reduce_core::message::Envelope;
use map_reduce_core::transport::{Source, Transport};
use map_reduce_core::types::Rank;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc::{self, Sender};

/// In-process transport endpoint backed by one tokio mpsc channel per ordered pair of ranks
pub struct ChannelTransport<M> {
    rank: Rank,
    process_count: usize,
    outbound: HashMap<Rank, Sender<M>>,
    inbox: Inbox<M>,
}

/// Builder for a fully connected set of channel transports
pub struct ChannelNetwork;

impl ChannelNetwork {
    /// One endpoint per rank, returned in rank order
    pub fn build<M>(process_count: usize, buffer: usize) -> Vec<ChannelTransport<M>>
    where
        M: Send + 'static,
    {
        let mut endpoints: Vec<ChannelTransport<M>> = (0..process_count)
            .map(|rank| ChannelTransport {
                rank,
                process_count,
                outbound: HashMap::new(),
                inbox: Inbox::new(),
            })
            .collect();

        for from in 0..process_count {
            for to in 0..process_count {
                if from == to {
                    continue;
                }
                let (tx, rx) = mpsc::channel(buffer.max(1));
                endpoints[from].outbound.insert(to, tx);
                endpoints[to].inbox.attach(from, rx);
            }
        }

        endpoints
    }
}

#[async_trait]
impl<M> Transport<M> for ChannelTransport<M>
where
    M: Send + 'static,
{
    fn self_rank(&self) -> Rank {
        self.rank
    }

    fn process_count(&self) -> usize {
        self.process_count
    }

    async fn send(&mut self, to: Rank, message: M) -> Result<(), TransportError> {
        let tx = self
            .outbound
            .get(&to)
            .ok_or(TransportError::UnknownRank(to))?;
        tx.send(message)
            .await
            .map_err(|_| TransportError::Disconnected(to))
    }

    async fn receive(
        &mut self,
        source: Source,
        timeout: Option<Duration>,
    ) -> Result<Option<Envelope<M>>, TransportError> {
        self.inbox.receive(source, timeout).await
    }
}
