// -------------------------------------------------------------------------------------------------
//  Copyright (C) 2025-2026 Discord Relay Authors. All rights reserved.
//
//  Licensed under the GNU Lesser General Public License Version 3.0 (the "License");
//  You may not use this file except in compliance with the License.
//  You may obtain a copy of the License at https://www.gnu.org/licenses/lgpl-3.0.en.html
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.
// -------------------------------------------------------------------------------------------------

//! Heartbeat monitor task.
//!
//! Runs alongside the connection handler and drives the keep-alive cadence:
//! an initial random delay in `[0, interval)` spreads load on the remote side,
//! after which heartbeats are requested at the advertised interval. Each beat
//! registers a fresh one-shot acknowledgement signal with the handler; a
//! missing acknowledgement within the deadline is treated as connection death.

use std::time::Duration;

use tokio::{sync::mpsc, task::JoinHandle};

use super::handler::HandlerCommand;

/// Spawns the heartbeat task for one connection.
///
/// The task ends when the handler's command channel closes (the socket output
/// is gone) or when an acknowledgement deadline is missed, in which case a
/// close-and-reconnect is requested through the handler exactly once.
pub(crate) fn spawn_heartbeat(
    cmd_tx: mpsc::UnboundedSender<HandlerCommand>,
    interval_ms: u64,
    ack_timeout: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let interval = Duration::from_millis(interval_ms);
        let initial = interval.mul_f64(rand::random::<f64>());
        tracing::debug!(?initial, "Waiting before the initial heartbeat");
        tokio::time::sleep(initial).await;

        loop {
            let (ack_tx, ack_rx) = tokio::sync::oneshot::channel();
            if cmd_tx
                .send(HandlerCommand::Heartbeat { ack: ack_tx })
                .is_err()
            {
                tracing::debug!("Connection handler gone, stopping heartbeat");
                break;
            }

            match tokio::time::timeout(ack_timeout, ack_rx).await {
                Ok(Ok(())) => tracing::trace!("Heartbeat acknowledged"),
                Ok(Err(_)) => {
                    tracing::debug!("Pending heartbeat dropped, stopping heartbeat");
                    break;
                }
                Err(_) => {
                    tracing::warn!("Timed out waiting for a heartbeat acknowledgement");
                    let _ = cmd_tx.send(HandlerCommand::HeartbeatTimedOut);
                    break;
                }
            }

            tracing::trace!(?interval, "Waiting for the next heartbeat");
            tokio::time::sleep(interval).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_heartbeats_repeat_while_acknowledged() {
        let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel();
        let task = spawn_heartbeat(cmd_tx, 10, Duration::from_millis(500));

        for _ in 0..3 {
            match cmd_rx.recv().await {
                Some(HandlerCommand::Heartbeat { ack }) => ack.send(()).unwrap(),
                other => panic!("expected heartbeat command, got {other:?}"),
            }
        }

        task.abort();
    }

    #[tokio::test]
    async fn test_missed_ack_requests_reconnect_once() {
        let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel();
        let task = spawn_heartbeat(cmd_tx, 10, Duration::from_millis(20));

        // Hold the signal without completing it so the deadline passes.
        let _pending = match cmd_rx.recv().await {
            Some(HandlerCommand::Heartbeat { ack }) => ack,
            other => panic!("expected heartbeat command, got {other:?}"),
        };

        assert!(matches!(
            cmd_rx.recv().await,
            Some(HandlerCommand::HeartbeatTimedOut)
        ));
        // The task stops after the timeout; the channel must close.
        assert!(cmd_rx.recv().await.is_none());

        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_stops_when_handler_gone() {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        drop(cmd_rx);

        let task = spawn_heartbeat(cmd_tx, 1, Duration::from_millis(20));
        task.await.unwrap();
    }
}
