// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::error::TransportError;
use crate::message::Envelope;
use crate::transport::Source;
use crate::types::Rank;
use std::time::Duration;
use tokio::sync::mpsc::Receiver;
use tokio::time::Instant;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::{StreamExt, StreamMap};

/// Inbound side of a transport: one FIFO stream per peer, merged with a StreamMap
pub struct Inbox<M> {
    streams: StreamMap<Rank, ReceiverStream<M>>,
}

impl<M> Default for Inbox<M> {
    fn default() -> Self {
        Self {
            streams: StreamMap::new(),
        }
    }
}

impl<M> Inbox<M>
where
    M: Send + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, from: Rank, rx: Receiver<M>) {
        self.streams.insert(from, ReceiverStream::new(rx));
    }

    pub fn is_attached(&self, from: Rank) -> bool {
        self.streams.contains_key(&from)
    }

    pub async fn receive(
        &mut self,
        source: Source,
        timeout: Option<Duration>,
    ) -> Result<Option<Envelope<M>>, TransportError> {
        if self.streams.is_empty() {
            // Nothing can arrive anymore; let a bounded wait run out instead of failing
            return match (source, timeout) {
                (Source::Any, Some(limit)) => {
                    tokio::time::sleep(limit).await;
                    Ok(None)
                }
                (Source::Any, None) => Err(TransportError::Closed),
                (Source::Rank(rank), _) => Err(TransportError::Disconnected(rank)),
            };
        }

        let any = matches!(source, Source::Any);
        let next = self.next_from(source);
        match timeout {
            Some(limit) => {
                let deadline = Instant::now() + limit;
                match tokio::time::timeout_at(deadline, next).await {
                    // Every peer hung up during the wait
                    Ok(Err(TransportError::Closed)) if any => {
                        tokio::time::sleep_until(deadline).await;
                        Ok(None)
                    }
                    Ok(received) => received.map(Some),
                    Err(_) => Ok(None),
                }
            }
            None => next.await.map(Some),
        }
    }

    async fn next_from(&mut self, source: Source) -> Result<Envelope<M>, TransportError> {
        match source {
            Source::Any => self
                .streams
                .next()
                .await
                .map(|(from, message)| Envelope { from, message })
                .ok_or(TransportError::Closed),
            Source::Rank(rank) => {
                let stream = self
                    .streams
                    .iter_mut()
                    .find(|(from, _)| *from == rank)
                    .map(|(_, stream)| stream)
                    .ok_or(TransportError::Disconnected(rank))?;
                let received = stream.next().await;
                match received {
                    Some(message) => Ok(Envelope {
                        from: rank,
                        message,
                    }),
                    None => {
                        self.streams.remove(&rank);
                        Err(TransportError::Disconnected(rank))
                    }
                }
            }
        }
    }
}
