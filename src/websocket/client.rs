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

//! Gateway client for the Discord real-time event stream.
//!
//! The [`DiscordGatewayClient`] owns session continuity across socket
//! lifetimes. A supervisor task opens connections, hands each socket to a
//! dedicated handler, and when a connection ends decides between resuming
//! and re-identifying, applying exponential backoff between attempts.
//! Consumers receive decoded dispatch events via [`DiscordGatewayClient::stream`].

use std::{
    sync::{
        atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering},
        Arc,
    },
    time::Duration,
};

use dashmap::DashMap;
use futures_util::Stream;
use tokio::{sync::mpsc, sync::RwLock, task::JoinHandle};
use tokio_tungstenite::connect_async;

use super::{
    error::{GatewayError, GatewayResult},
    handler::{
        ConnectionOutcome, GatewayConnectionHandler, GatewaySettings, HandlerCommand,
        HandlerShared,
    },
    messages::GatewayMessage,
    session::{reconnect_backoff, Session},
};
use crate::{
    common::{
        consts::{intents::RELAY_INTENTS, GATEWAY_ENCODING},
        credential::Credential,
        enums::{is_resumable_close_code, ConnectionState, CLOSE_CODE_GOING_AWAY},
    },
    config::DiscordRelayConfig,
    http::{client::DiscordHttpClient, models::Role, models::User},
};

/// Gateway client for connecting to Discord.
#[derive(Debug)]
pub struct DiscordGatewayClient {
    http: Arc<DiscordHttpClient>,
    shared: HandlerShared,
    shutdown: Arc<AtomicBool>,
    cmd_slot: Arc<RwLock<Option<mpsc::UnboundedSender<HandlerCommand>>>>,
    out_rx: Option<mpsc::UnboundedReceiver<GatewayMessage>>,
    supervisor: Option<JoinHandle<()>>,
    connect_timeout: Duration,
    api_version: u8,
    gateway_url_override: Option<String>,
}

impl DiscordGatewayClient {
    /// Creates a new [`DiscordGatewayClient`].
    ///
    /// The REST client is injected so endpoint discovery and reconnection share
    /// the same rate-limited HTTP stack as the rest of the application.
    #[must_use]
    pub fn new(config: &DiscordRelayConfig, http: Arc<DiscordHttpClient>) -> Self {
        let settings = GatewaySettings {
            credential: Credential::new(config.bot_token.clone()),
            intents: RELAY_INTENTS,
            guild_id: config.guild_id.clone(),
            heartbeat_timeout: Duration::from_secs(config.heartbeat_timeout_secs),
        };

        let shared = HandlerShared {
            settings: Arc::new(settings),
            session: Arc::new(RwLock::new(Session::default())),
            state: Arc::new(AtomicU8::new(ConnectionState::Disconnected.as_u8())),
            reconnect_attempts: Arc::new(AtomicU32::new(0)),
            bot_user: Arc::new(RwLock::new(None)),
            server_roles: Arc::new(DashMap::new()),
        };

        Self {
            http,
            shared,
            shutdown: Arc::new(AtomicBool::new(false)),
            cmd_slot: Arc::new(RwLock::new(None)),
            out_rx: None,
            supervisor: None,
            connect_timeout: Duration::from_secs(config.http_timeout_secs),
            api_version: config.api_version,
            gateway_url_override: config.base_url_gateway.clone(),
        }
    }

    /// Returns the current connection state.
    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.shared.state.load(Ordering::Relaxed))
    }

    /// Returns whether the session is established and heartbeating.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.connection_state() == ConnectionState::Ready
    }

    /// Returns whether the client was finally closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
            && self.connection_state() == ConnectionState::Disconnected
    }

    /// Returns the last sequence number seen on the connection.
    pub async fn sequence(&self) -> Option<u64> {
        self.shared.session.read().await.sequence
    }

    /// Returns the current session id, when a session is established.
    pub async fn session_id(&self) -> Option<String> {
        self.shared.session.read().await.session_id.clone()
    }

    /// Returns the bot's own user, captured from the ready dispatch.
    pub async fn bot_user(&self) -> Option<User> {
        self.shared.bot_user.read().await.clone()
    }

    /// Looks up a cached role of the configured guild by id.
    #[must_use]
    pub fn role(&self, role_id: &str) -> Option<Role> {
        self.shared
            .server_roles
            .get(role_id)
            .map(|entry| entry.value().clone())
    }

    /// Returns the number of cached roles for the configured guild.
    #[must_use]
    pub fn role_count(&self) -> usize {
        self.shared.server_roles.len()
    }

    /// Waits until the session is active or the timeout expires.
    ///
    /// # Errors
    ///
    /// Returns an error if the timeout expires before the session establishes.
    pub async fn wait_until_active(&self, timeout_secs: f64) -> GatewayResult<()> {
        let timeout = Duration::from_secs_f64(timeout_secs);
        tokio::time::timeout(timeout, async {
            while !self.is_active() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .map_err(|_| {
            GatewayError::Timeout(format!(
                "Gateway connection timeout after {timeout_secs} seconds"
            ))
        })
    }

    /// Connects to the Gateway, fetching the endpoint via REST unless overridden.
    ///
    /// Any existing connection is closed first; exactly one socket is live per
    /// client. The connection is then supervised for the client's lifetime:
    /// drops, server-requested reconnects, and missed heartbeats recover
    /// internally and are only observable through logging.
    ///
    /// # Errors
    ///
    /// Returns an error if the Gateway endpoint cannot be fetched. Transport
    /// failures while opening the socket are retried by the supervisor.
    pub async fn connect(&mut self) -> GatewayResult<()> {
        if self.supervisor.is_some() {
            tracing::info!("Closing existing Gateway connection");
            self.close(CLOSE_CODE_GOING_AWAY, "Closing existing connection.", false)
                .await;
            if let Some(task) = self.supervisor.take() {
                task.abort();
            }
        }

        let endpoint = match &self.gateway_url_override {
            Some(url) => url.clone(),
            None => self.http.get_gateway().await?.url,
        };
        tracing::info!(endpoint = %endpoint, "Discord Gateway endpoint");

        let (out_tx, out_rx) = mpsc::unbounded_channel();
        self.out_rx = Some(out_rx);

        let context = SupervisorContext {
            http: self.http.clone(),
            shared: self.shared.clone(),
            shutdown: self.shutdown.clone(),
            cmd_slot: self.cmd_slot.clone(),
            out_tx,
            connect_timeout: self.connect_timeout,
            api_version: self.api_version,
        };
        self.supervisor = Some(tokio::spawn(run_supervisor(context, endpoint)));

        Ok(())
    }

    /// Closes the connection with the given close code and reason.
    ///
    /// With `is_final` set, all future reconnect attempts are suppressed for
    /// the remainder of this client's lifetime; use it for deliberate
    /// shutdown.
    pub async fn close(&self, code: u16, reason: &str, is_final: bool) {
        tracing::info!(code, reason, is_final, "Closing Gateway client");
        if is_final {
            self.shutdown.store(true, Ordering::Relaxed);
        }
        self.shared.set_state(ConnectionState::Closing);

        let guard = self.cmd_slot.read().await;
        match guard.as_ref() {
            Some(cmd_tx) => {
                let _ = cmd_tx.send(HandlerCommand::Close {
                    code,
                    reason: reason.to_string(),
                });
            }
            None => {
                // Nothing connected; the supervisor (if any) observes the
                // shutdown flag at its next step.
                self.shared.set_state(ConnectionState::Disconnected);
            }
        }
    }

    /// Returns the stream of decoded Gateway events.
    ///
    /// # Panics
    ///
    /// Panics if called before [`Self::connect`] or called twice.
    pub fn stream(&mut self) -> impl Stream<Item = GatewayMessage> + 'static {
        let mut out_rx = self
            .out_rx
            .take()
            .expect("Event stream receiver already taken or not connected");

        async_stream::stream! {
            while let Some(message) = out_rx.recv().await {
                yield message;
            }
        }
    }
}

/// Everything the supervisor task needs to run connections.
#[derive(Debug, Clone)]
struct SupervisorContext {
    http: Arc<DiscordHttpClient>,
    shared: HandlerShared,
    shutdown: Arc<AtomicBool>,
    cmd_slot: Arc<RwLock<Option<mpsc::UnboundedSender<HandlerCommand>>>>,
    out_tx: mpsc::UnboundedSender<GatewayMessage>,
    connect_timeout: Duration,
    api_version: u8,
}

impl SupervisorContext {
    fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }
}

/// Supervises the connection lifecycle: open, drive, decide, back off, repeat.
async fn run_supervisor(context: SupervisorContext, mut endpoint: String) {
    loop {
        if context.is_shutdown() {
            break;
        }

        context.shared.set_state(ConnectionState::Connecting);

        let resume = match run_connection(&context, &endpoint).await {
            Ok(ConnectionOutcome::Closed { code }) => {
                let resume = code.is_some_and(is_resumable_close_code);
                tracing::info!(?code, resume, "Gateway connection ended");
                resume
            }
            Ok(ConnectionOutcome::ReconnectRequested { resume }) => resume,
            Ok(ConnectionOutcome::TransportError | ConnectionOutcome::ProtocolViolation) => {
                // Session continuity cannot be trusted after a transport error.
                cleanup_after_error(&context).await;
                false
            }
            Err(e) => {
                tracing::error!(error = %e, endpoint = %endpoint, "Failed to open Gateway connection");
                cleanup_after_error(&context).await;
                context
                    .shared
                    .reconnect_attempts
                    .fetch_add(1, Ordering::Relaxed);
                false
            }
        };

        if context.is_shutdown() {
            break;
        }

        context.shared.set_state(ConnectionState::Reconnecting);
        let attempts = context.shared.reconnect_attempts.load(Ordering::Relaxed);
        let delay = reconnect_backoff(attempts);
        tracing::debug!(attempts, ?delay, resume, "Waiting before reconnect attempt");
        tokio::time::sleep(delay).await;

        if context.is_shutdown() {
            break;
        }

        let resume_url = if resume {
            context.shared.session.read().await.resume_gateway_url.clone()
        } else {
            None
        };
        match resume_url {
            Some(url) => endpoint = url,
            None => match context.http.get_gateway().await {
                Ok(gateway) => endpoint = gateway.url,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to fetch Gateway endpoint");
                    cleanup_after_error(&context).await;
                    context
                        .shared
                        .reconnect_attempts
                        .fetch_add(1, Ordering::Relaxed);
                    continue;
                }
            },
        }
        context.shared.session.write().await.should_resume = resume;
        tracing::info!(endpoint = %endpoint, resume, "Reconnecting to Gateway");
    }

    context.shared.set_state(ConnectionState::Disconnected);
    tracing::info!("Gateway supervisor stopped");
}

/// Opens one socket and drives its handler to completion.
async fn run_connection(
    context: &SupervisorContext,
    endpoint: &str,
) -> GatewayResult<ConnectionOutcome> {
    let url = format!(
        "{endpoint}?v={}&encoding={GATEWAY_ENCODING}",
        context.api_version
    );
    tracing::info!(url = %url, "Opening Gateway connection");

    let (ws, _response) = tokio::time::timeout(context.connect_timeout, connect_async(url.as_str()))
        .await
        .map_err(|_| GatewayError::Timeout(format!("Connection to '{url}' timed out")))?
        .map_err(|e| GatewayError::Transport(e.to_string()))?;

    tracing::debug!("Gateway connection opened");
    context.shared.set_state(ConnectionState::AwaitingHello);

    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    *context.cmd_slot.write().await = Some(cmd_tx.clone());

    let handler = GatewayConnectionHandler::new(
        context.shared.clone(),
        ws,
        cmd_tx,
        cmd_rx,
        context.out_tx.clone(),
    );
    let outcome = tokio::spawn(handler.run())
        .await
        .unwrap_or(ConnectionOutcome::TransportError);

    *context.cmd_slot.write().await = None;
    Ok(outcome)
}

/// Resets session and identity state after an error; nothing about the
/// previous connection can be trusted anymore.
async fn cleanup_after_error(context: &SupervisorContext) {
    tracing::debug!("Resetting session state after connection error");
    context.shared.session.write().await.reset();
    *context.shared.bot_user.write().await = None;
}
