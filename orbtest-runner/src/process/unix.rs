// Copyright (c) The orbtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::errors::TerminateError;
use libc::{SIGKILL, SIGTERM};
use std::time::Duration;
use tokio::process::Child;

/// Sends SIGTERM, then SIGKILL if the child is still around after `grace_period`.
pub(super) async fn terminate_child(
    child: &mut Child,
    grace_period: Duration,
) -> Result<(), TerminateError> {
    // `id` returns None once the child has been reaped.
    let Some(pid) = child.id() else {
        return Ok(());
    };
    if let Ok(Some(_)) = child.try_wait() {
        return Ok(());
    }

    // If the process exited in the meantime, kill fails with ESRCH, which is fine to ignore.
    unsafe { libc::kill(pid as libc::pid_t, SIGTERM) };

    if tokio::time::timeout(grace_period, child.wait()).await.is_err() {
        tracing::debug!("process {pid} didn't exit within {grace_period:?}, sending SIGKILL");
        unsafe { libc::kill(pid as libc::pid_t, SIGKILL) };
        // SIGKILL can't be caught, so this returns promptly.
        _ = child.wait().await;
    }

    Ok(())
}
