// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use map_reduce_core::error::TransportError;
use map_reduce_core::types::Rank;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

pub const MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

/// What travels on a connection: one hello from the worker, then messages both ways
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub enum WireFrame<M> {
    Hello { rank: Rank },
    Payload(M),
}

/// 4-byte big-endian length followed by a JSON body
pub fn encode_frame<T: Serialize>(value: &T) -> Result<Vec<u8>, TransportError> {
    let serialized = serde_json::to_vec(value)?;
    if serialized.len() > MAX_FRAME_LEN {
        return Err(TransportError::FrameTooLarge(serialized.len()));
    }
    let len = serialized.len() as u32;
    let mut frame = Vec::with_capacity(4 + serialized.len());
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(&serialized);
    Ok(frame)
}

pub async fn write_frame<W>(writer: &mut W, frame: &[u8]) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(frame).await?;
    writer.flush().await?;
    Ok(())
}

/// `Ok(None)` when the peer closed the connection between frames
pub async fn read_frame<R, T>(reader: &mut R) -> Result<Option<T>, TransportError>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let mut len_bytes = [0u8; 4];
    match reader.read_exact(&mut len_bytes).await {
        Ok(_) => {}
        Err(err) if err.kind() == ErrorKind::UnexpectedEof => return Ok(None),
        Err(err) => return Err(err.into()),
    }

    let len = u32::from_be_bytes(len_bytes) as usize;
    if len > MAX_FRAME_LEN {
        return Err(TransportError::FrameTooLarge(len));
    }
    let mut buffer = vec![0u8; len];
    reader.read_exact(&mut buffer).await?;
    Ok(Some(serde_json::from_slice(&buffer)?))
}
