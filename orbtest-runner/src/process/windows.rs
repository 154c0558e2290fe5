// Copyright (c) The orbtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::errors::TerminateError;
use std::time::Duration;
use tokio::process::Child;

/// How many times to check whether a child survived a failed termination.
const POLL_ATTEMPTS: usize = 3;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Terminates the child.
///
/// TerminateProcess fails if the process is already gone. In that case the child is polled a few
/// times, and the failure is only reported if it is still alive.
pub(super) async fn terminate_child(
    child: &mut Child,
    _grace_period: Duration,
) -> Result<(), TerminateError> {
    let Some(pid) = child.id() else {
        return Ok(());
    };

    match child.start_kill() {
        Ok(()) => {
            _ = child.wait().await;
            Ok(())
        }
        Err(err) => {
            for _ in 0..POLL_ATTEMPTS {
                if let Ok(Some(_)) = child.try_wait() {
                    return Ok(());
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
            Err(TerminateError::new(pid, Some(err)))
        }
    }
}
