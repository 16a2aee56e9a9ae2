// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use map_reduce_core::types::Rank;
use std::io;
use std::path::Path;
use std::process::Stdio;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

/// Child process that is killed if it is still running when dropped
pub struct AutoKillChild {
    rank: Rank,
    child: Child,
}

impl AutoKillChild {
    pub fn rank(&self) -> Rank {
        self.rank
    }

    pub async fn wait(mut self) -> io::Result<()> {
        let status = self.child.wait().await?;
        if !status.success() {
            warn!(rank = self.rank, %status, "worker process exited with failure");
        }
        Ok(())
    }
}

impl Drop for AutoKillChild {
    fn drop(&mut self) {
        let _ = self.child.start_kill();
    }
}

/// Re-launch the current executable once per worker rank, all pointed at `addr`
pub fn spawn_local_workers(
    addr: &str,
    processes: usize,
    config: Option<&Path>,
) -> io::Result<Vec<AutoKillChild>> {
    let exe = std::env::current_exe()?;
    let mut children = Vec::with_capacity(processes.saturating_sub(1));

    for rank in 1..processes {
        let mut command = Command::new(&exe);
        command
            .arg("--rank")
            .arg(rank.to_string())
            .arg("--processes")
            .arg(processes.to_string())
            .arg("--addr")
            .arg(addr)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        if let Some(path) = config {
            command.arg("--config").arg(path);
        }

        let child = command.spawn()?;
        debug!(rank, pid = child.id(), "spawned worker process");
        children.push(AutoKillChild { rank, child });
    }

    Ok(children)
}
