// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

pub mod frame;
pub mod process_runtime;
pub mod socket_transport;

pub use socket_transport::{ConnectRetry, SocketTransport};
