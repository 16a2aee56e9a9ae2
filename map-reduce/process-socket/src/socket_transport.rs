// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use crate::frame::{encode_frame, read_frame, write_frame, WireFrame};
use async_trait::async_trait;
use map_reduce_core::error::TransportError;
use map_reduce_core::inbox::Inbox;
use map_reduce_core::message::Envelope;
use map_reduce_core::transport::{Source, Transport};
use map_reduce_core::types::{Rank, COORDINATOR_RANK};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::{self, Sender};
use tokio::time::{sleep, timeout_at, Instant};
use tokio_stream::wrappers::TcpListenerStream;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const INBOUND_BUFFER: usize = 64;

/// How long one accepted connection gets to send its hello
pub const HELLO_TIMEOUT: Duration = Duration::from_secs(1);

/// How a worker keeps trying to reach a coordinator that may not be listening yet
#[derive(Debug, Clone, Copy)]
pub struct ConnectRetry {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for ConnectRetry {
    fn default() -> Self {
        Self {
            attempts: 50,
            delay: Duration::from_millis(100),
        }
    }
}

/// TCP transport: the coordinator holds one connection per worker, a worker holds one to the coordinator
pub struct SocketTransport<M> {
    rank: Rank,
    process_count: usize,
    writers: HashMap<Rank, OwnedWriteHalf>,
    inbox: Inbox<M>,
    shutdown: CancellationToken,
}

impl<M> SocketTransport<M>
where
    M: Serialize + DeserializeOwned + Send + 'static,
{
    fn empty(rank: Rank, process_count: usize) -> Self {
        Self {
            rank,
            process_count,
            writers: HashMap::new(),
            inbox: Inbox::new(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Coordinator side: wait until every worker rank has connected and said hello
    pub async fn accept_workers(
        listener: TcpListener,
        process_count: usize,
        handshake_timeout: Duration,
    ) -> Result<Self, TransportError> {
        let mut transport = Self::empty(COORDINATOR_RANK, process_count);
        let expected = process_count.saturating_sub(1);
        let deadline = Instant::now() + handshake_timeout;
        let mut incoming = TcpListenerStream::new(listener);

        while transport.writers.len() < expected {
            let stream = match timeout_at(deadline, incoming.next()).await {
                Ok(Some(stream)) => stream?,
                Ok(None) => return Err(TransportError::Closed),
                Err(_) => {
                    return Err(TransportError::Handshake(format!(
                        "only {} of {} workers connected",
                        transport.writers.len(),
                        expected
                    )))
                }
            };
            stream.set_nodelay(true)?;
            let (mut reader, writer) = stream.into_split();

            let hello_deadline = deadline.min(Instant::now() + HELLO_TIMEOUT);
            let rank = match timeout_at(hello_deadline, read_frame::<_, WireFrame<M>>(&mut reader)).await {
                Ok(Ok(Some(WireFrame::Hello { rank }))) => rank,
                Ok(Ok(_)) => {
                    warn!("connection did not start with a hello, dropping it");
                    continue;
                }
                Ok(Err(err)) => {
                    warn!(error = %err, "handshake read failed, dropping connection");
                    continue;
                }
                Err(_) => {
                    warn!("connection sent no hello in time, dropping it");
                    continue;
                }
            };

            if rank == COORDINATOR_RANK || rank >= process_count || transport.inbox.is_attached(rank)
            {
                warn!(rank, "rejecting connection with invalid or duplicate rank");
                continue;
            }

            info!(rank, "worker connected");
            transport.attach(rank, reader, writer);
        }

        Ok(transport)
    }

    /// Worker side: connect to the coordinator and introduce ourselves
    pub async fn connect(
        addr: &str,
        rank: Rank,
        process_count: usize,
        retry: ConnectRetry,
    ) -> Result<Self, TransportError> {
        if rank == COORDINATOR_RANK || rank >= process_count {
            return Err(TransportError::Handshake(format!(
                "rank {rank} is not a worker rank for {process_count} processes"
            )));
        }

        let mut attempt = 0;
        let stream = loop {
            attempt += 1;
            match TcpStream::connect(addr).await {
                Ok(stream) => break stream,
                Err(err) if attempt < retry.attempts => {
                    debug!(rank, attempt, error = %err, "coordinator not reachable yet");
                    sleep(retry.delay).await;
                }
                Err(err) => return Err(err.into()),
            }
        };
        stream.set_nodelay(true)?;

        let (reader, mut writer) = stream.into_split();
        let hello = encode_frame(&WireFrame::<M>::Hello { rank })?;
        write_frame(&mut writer, &hello).await?;

        let mut transport = Self::empty(rank, process_count);
        transport.attach(COORDINATOR_RANK, reader, writer);
        debug!(rank, addr, "connected to coordinator");
        Ok(transport)
    }

    fn attach(&mut self, peer: Rank, reader: OwnedReadHalf, writer: OwnedWriteHalf) {
        let (tx, rx) = mpsc::channel(INBOUND_BUFFER);
        self.inbox.attach(peer, rx);
        self.writers.insert(peer, writer);
        tokio::spawn(read_loop(peer, reader, tx, self.shutdown.clone()));
    }
}

/// Pump frames from one connection into the inbox until it closes or the transport is dropped
async fn read_loop<M>(
    peer: Rank,
    mut reader: OwnedReadHalf,
    tx: Sender<M>,
    shutdown: CancellationToken,
) where
    M: DeserializeOwned + Send + 'static,
{
    loop {
        let frame = tokio::select! {
            _ = shutdown.cancelled() => break,
            frame = read_frame::<_, WireFrame<M>>(&mut reader) => frame,
        };

        match frame {
            Ok(Some(WireFrame::Payload(message))) => {
                if tx.send(message).await.is_err() {
                    break;
                }
            }
            Ok(Some(WireFrame::Hello { .. })) => {
                warn!(rank = peer, "ignoring repeated hello");
            }
            Ok(None) => {
                debug!(rank = peer, "peer closed the connection");
                break;
            }
            Err(err) => {
                warn!(rank = peer, error = %err, "dropping connection after read error");
                break;
            }
        }
    }
}

impl<M> Drop for SocketTransport<M> {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[async_trait]
impl<M> Transport<M> for SocketTransport<M>
where
    M: Serialize + DeserializeOwned + Send + 'static,
{
    fn self_rank(&self) -> Rank {
        self.rank
    }

    fn process_count(&self) -> usize {
        self.process_count
    }

    async fn send(&mut self, to: Rank, message: M) -> Result<(), TransportError> {
        let frame = encode_frame(&WireFrame::Payload(message))?;
        let writer = self
            .writers
            .get_mut(&to)
            .ok_or(TransportError::UnknownRank(to))?;
        write_frame(writer, &frame).await
    }

    async fn receive(
        &mut self,
        source: Source,
        timeout: Option<Duration>,
    ) -> Result<Option<Envelope<M>>, TransportError> {
        self.inbox.receive(source, timeout).await
    }
}
