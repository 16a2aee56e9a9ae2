// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

pub mod channel_transport;
pub mod local_runtime;

pub use channel_transport::{ChannelNetwork, ChannelTransport};
pub use local_runtime::{run_job, JobOutput};
