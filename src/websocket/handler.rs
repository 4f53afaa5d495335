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

//! Per-connection message handler.
//!
//! The handler runs in a dedicated Tokio task for the lifetime of one socket.
//! It exclusively owns the WebSocket, so every outbound frame (handshake,
//! heartbeat, close) passes through a single writer and frames can never
//! interleave. Inbound frames are decoded once into the envelope and
//! dispatched by opcode; dispatch events are routed by name.

use std::sync::{
    atomic::{AtomicU32, AtomicU8, Ordering},
    Arc,
};

use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::{
    net::TcpStream,
    sync::{mpsc, oneshot, RwLock},
    task::JoinHandle,
};
use tokio_tungstenite::{
    tungstenite::{
        protocol::{frame::coding::CloseCode, CloseFrame},
        Message as WsMessage,
    },
    MaybeTlsStream, WebSocketStream,
};

use super::{
    error::GatewayError,
    heartbeat::spawn_heartbeat,
    messages::{
        parse_frame, GatewayFrame, GatewayMessage, GuildCreate, Hello, Identify,
        IdentifyProperties, Interaction, Ready, Resume,
    },
    session::Session,
};
use crate::{
    common::{
        consts::DISCORD_RELAY_IDENT,
        credential::Credential,
        enums::{ConnectionState, DispatchEvent, OpCode, CLOSE_CODE_GOING_AWAY},
    },
    http::models::{Message, Role, User},
};

/// The WebSocket transport owned by a handler.
pub(crate) type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Commands sent from the client and the heartbeat monitor to the handler.
#[derive(Debug)]
pub(crate) enum HandlerCommand {
    /// Send a heartbeat and register the acknowledgement signal.
    Heartbeat { ack: oneshot::Sender<()> },
    /// A heartbeat acknowledgement deadline was missed.
    HeartbeatTimedOut,
    /// Close the connection with the given code and reason.
    Close { code: u16, reason: String },
}

/// How a connection ended, driving the supervisor's reconnect decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConnectionOutcome {
    /// The socket closed; resume eligibility is derived from the close code.
    Closed { code: Option<u16> },
    /// Transport-level failure; session continuity cannot be trusted.
    TransportError,
    /// The server violated the protocol contract; the connection is abandoned.
    ProtocolViolation,
    /// Protocol-driven reconnect (server instruction, invalid session, or
    /// missed heartbeat acknowledgement).
    ReconnectRequested { resume: bool },
}

/// Connection-wide configuration shared with each handler.
#[derive(Debug)]
pub(crate) struct GatewaySettings {
    /// Bot token credential.
    pub credential: Credential,
    /// Gateway intents requested on identify.
    pub intents: u64,
    /// Guild whose role snapshots are cached.
    pub guild_id: String,
    /// Deadline for heartbeat acknowledgements.
    pub heartbeat_timeout: std::time::Duration,
}

/// State shared between the client, supervisor, and the active handler.
#[derive(Debug, Clone)]
pub(crate) struct HandlerShared {
    pub settings: Arc<GatewaySettings>,
    pub session: Arc<RwLock<Session>>,
    pub state: Arc<AtomicU8>,
    pub reconnect_attempts: Arc<AtomicU32>,
    pub bot_user: Arc<RwLock<Option<User>>>,
    pub server_roles: Arc<DashMap<String, Role>>,
}

impl HandlerShared {
    pub(crate) fn set_state(&self, state: ConnectionState) {
        self.state.store(state.as_u8(), Ordering::Relaxed);
    }
}

/// Gateway connection handler; the I/O boundary for one socket.
pub(crate) struct GatewayConnectionHandler {
    shared: HandlerShared,
    ws: WsStream,
    cmd_tx: mpsc::UnboundedSender<HandlerCommand>,
    cmd_rx: mpsc::UnboundedReceiver<HandlerCommand>,
    out_tx: mpsc::UnboundedSender<GatewayMessage>,
    heartbeat_task: Option<JoinHandle<()>>,
    pending_ack: Option<oneshot::Sender<()>>,
}

impl GatewayConnectionHandler {
    /// Creates a new handler owning `ws`.
    pub(crate) fn new(
        shared: HandlerShared,
        ws: WsStream,
        cmd_tx: mpsc::UnboundedSender<HandlerCommand>,
        cmd_rx: mpsc::UnboundedReceiver<HandlerCommand>,
        out_tx: mpsc::UnboundedSender<GatewayMessage>,
    ) -> Self {
        Self {
            shared,
            ws,
            cmd_tx,
            cmd_rx,
            out_tx,
            heartbeat_task: None,
            pending_ack: None,
        }
    }

    /// Runs the handler until the connection ends.
    pub(crate) async fn run(mut self) -> ConnectionOutcome {
        let outcome = self.run_loop().await;

        if let Some(task) = self.heartbeat_task.take() {
            task.abort();
        }
        self.pending_ack = None;

        tracing::debug!(?outcome, "Connection handler finished");
        outcome
    }

    async fn run_loop(&mut self) -> ConnectionOutcome {
        loop {
            tokio::select! {
                command = self.cmd_rx.recv() => match command {
                    Some(command) => {
                        if let Some(outcome) = self.process_command(command).await {
                            return outcome;
                        }
                    }
                    // Client dropped without a close; treat as local closure.
                    None => return ConnectionOutcome::Closed { code: None },
                },
                message = self.ws.next() => match message {
                    Some(Ok(WsMessage::Text(text))) => {
                        match self.process_frame(text.as_str()).await {
                            Ok(None) => {}
                            Ok(Some(outcome)) => return outcome,
                            Err(e) => {
                                tracing::error!(error = %e, "Abandoning connection after protocol violation");
                                return ConnectionOutcome::ProtocolViolation;
                            }
                        }
                    }
                    Some(Ok(WsMessage::Ping(payload))) => {
                        let _ = self.ws.send(WsMessage::Pong(payload)).await;
                    }
                    Some(Ok(WsMessage::Close(frame))) => {
                        let code = frame.as_ref().map(|f| u16::from(f.code));
                        let reason = frame.as_ref().map(|f| f.reason.to_string());
                        tracing::info!(?code, ?reason, "Gateway connection closed");
                        return ConnectionOutcome::Closed { code };
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::error!(error = %e, "Gateway transport error");
                        return ConnectionOutcome::TransportError;
                    }
                    None => {
                        tracing::warn!("Gateway stream ended without a close frame");
                        return ConnectionOutcome::TransportError;
                    }
                },
            }
        }
    }

    /// Processes a command, returning a terminal outcome when the connection ends.
    async fn process_command(&mut self, command: HandlerCommand) -> Option<ConnectionOutcome> {
        match command {
            HandlerCommand::Heartbeat { ack } => {
                self.pending_ack = Some(ack);
                if let Err(e) = self.send_heartbeat().await {
                    tracing::error!(error = %e, "Failed to send heartbeat");
                    return Some(ConnectionOutcome::TransportError);
                }
            }
            HandlerCommand::HeartbeatTimedOut => {
                self.send_close(CLOSE_CODE_GOING_AWAY, "No heartbeat acknowledgement.")
                    .await;
                return Some(ConnectionOutcome::ReconnectRequested { resume: true });
            }
            HandlerCommand::Close { code, reason } => {
                self.send_close(code, &reason).await;
                return Some(ConnectionOutcome::Closed { code: Some(code) });
            }
        }
        None
    }

    /// Decodes and dispatches one inbound frame.
    ///
    /// Returns a terminal outcome when the frame ends the connection, and an
    /// error on protocol contract violations.
    async fn process_frame(
        &mut self,
        text: &str,
    ) -> Result<Option<ConnectionOutcome>, GatewayError> {
        tracing::trace!(payload = text, "Received frame");
        let frame = parse_frame(text)?;

        if let Some(sequence) = frame.s {
            self.shared.session.write().await.update_sequence(sequence);
        }

        match OpCode::from_u8(frame.op) {
            Some(OpCode::Hello) => {
                let data = frame
                    .d
                    .ok_or_else(|| GatewayError::MissingPayload("hello".to_string()))?;
                self.handle_hello(data).await
            }
            Some(OpCode::Reconnect) => {
                tracing::info!("Server requested reconnect");
                self.send_close(CLOSE_CODE_GOING_AWAY, "Told to reconnect.")
                    .await;
                Ok(Some(ConnectionOutcome::ReconnectRequested { resume: true }))
            }
            Some(OpCode::InvalidSession) => {
                let data = frame
                    .d
                    .ok_or_else(|| GatewayError::MissingPayload("invalid session".to_string()))?;
                let resumable: bool = serde_json::from_value(data)?;
                tracing::warn!(resumable, "Session invalidated by server");
                self.send_close(CLOSE_CODE_GOING_AWAY, "Session is invalid.")
                    .await;
                Ok(Some(ConnectionOutcome::ReconnectRequested { resume: resumable }))
            }
            Some(OpCode::Heartbeat) => {
                // Out-of-band server ping; answer immediately.
                tracing::debug!("Heartbeat requested by server");
                if let Err(e) = self.send_heartbeat().await {
                    tracing::error!(error = %e, "Failed to answer requested heartbeat");
                    return Ok(Some(ConnectionOutcome::TransportError));
                }
                Ok(None)
            }
            Some(OpCode::HeartbeatAck) => {
                if let Some(ack) = self.pending_ack.take() {
                    let _ = ack.send(());
                }
                Ok(None)
            }
            Some(OpCode::Dispatch) => {
                let name = match &frame.t {
                    Some(name) => name.clone(),
                    None => {
                        tracing::debug!("Ignoring dispatch frame without an event name");
                        return Ok(None);
                    }
                };
                let data = frame
                    .d
                    .ok_or_else(|| GatewayError::MissingPayload(name.clone()))?;
                self.handle_dispatch(&name, data).await?;
                Ok(None)
            }
            _ => {
                tracing::debug!(op = frame.op, "Ignoring unhandled Gateway operation");
                Ok(None)
            }
        }
    }

    async fn handle_hello(
        &mut self,
        data: Value,
    ) -> Result<Option<ConnectionOutcome>, GatewayError> {
        let hello: Hello = serde_json::from_value(data)?;
        tracing::debug!(
            interval_ms = hello.heartbeat_interval,
            "Received hello, starting heartbeat",
        );
        self.start_heartbeating(hello.heartbeat_interval);

        let resume_context = {
            let mut session = self.shared.session.write().await;
            let context = if session.should_resume {
                session.resume_context()
            } else {
                None
            };
            session.should_resume = false;
            if context.is_none() {
                session.clear_handshake();
            }
            context
        };

        let sent = match resume_context {
            Some((session_id, seq)) => {
                tracing::info!(session_id = %session_id, seq, "Resuming Gateway session");
                let resume = Resume {
                    token: self.shared.settings.credential.token().to_string(),
                    session_id,
                    seq,
                };
                self.send_frame(OpCode::Resume, Some(serde_json::to_value(&resume)?))
                    .await
            }
            None => {
                tracing::info!("Identifying new Gateway session");
                let identity = DISCORD_RELAY_IDENT.clone();
                let identify = Identify {
                    token: self.shared.settings.credential.token().to_string(),
                    intents: self.shared.settings.intents,
                    properties: IdentifyProperties {
                        os: std::env::consts::OS.to_string(),
                        browser: identity.clone(),
                        device: identity,
                    },
                };
                self.send_frame(OpCode::Identify, Some(serde_json::to_value(&identify)?))
                    .await
            }
        };

        match sent {
            Ok(()) => {
                self.shared.set_state(ConnectionState::Authenticating);
                Ok(None)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to send handshake");
                Ok(Some(ConnectionOutcome::TransportError))
            }
        }
    }

    async fn handle_dispatch(&mut self, name: &str, data: Value) -> Result<(), GatewayError> {
        let event = match name.parse::<DispatchEvent>() {
            Ok(event) => event,
            Err(_) => {
                tracing::debug!(name, "Ignoring unrecognized Gateway event");
                return Ok(());
            }
        };

        match event {
            DispatchEvent::Ready => {
                let ready: Ready = serde_json::from_value(data)?;
                tracing::info!(
                    username = %ready.user.username,
                    user_id = %ready.user.id,
                    "Gateway session ready",
                );
                self.shared
                    .session
                    .write()
                    .await
                    .capture_ready(ready.session_id, ready.resume_gateway_url);
                *self.shared.bot_user.write().await = Some(ready.user.clone());
                self.mark_established();
                let _ = self.out_tx.send(GatewayMessage::Ready(Box::new(ready.user)));
            }
            DispatchEvent::Resumed => {
                tracing::info!("Gateway session resumed");
                self.mark_established();
                let _ = self.out_tx.send(GatewayMessage::Resumed);
            }
            DispatchEvent::MessageCreate => {
                let message: Message = serde_json::from_value(data)?;
                tracing::debug!(
                    message_id = %message.id,
                    channel_id = %message.channel_id,
                    author = %message.author.username,
                    "Received message",
                );
                let _ = self
                    .out_tx
                    .send(GatewayMessage::MessageCreate(Box::new(message)));
            }
            DispatchEvent::GuildCreate => {
                let guild: GuildCreate = serde_json::from_value(data)?;
                if guild.id != self.shared.settings.guild_id {
                    tracing::debug!(
                        guild_id = %guild.id,
                        name = ?guild.name,
                        "Ignoring guild snapshot for other guild",
                    );
                    return Ok(());
                }
                self.shared.server_roles.clear();
                for role in &guild.roles {
                    self.shared.server_roles.insert(role.id.clone(), role.clone());
                }
                tracing::debug!(
                    guild_id = %guild.id,
                    roles = guild.roles.len(),
                    "Cached guild role snapshot",
                );
                let _ = self.out_tx.send(GatewayMessage::GuildRoles {
                    guild_id: guild.id,
                    roles: guild.roles,
                });
            }
            DispatchEvent::InteractionCreate => {
                let interaction: Interaction = serde_json::from_value(data)?;
                tracing::debug!(
                    interaction_id = %interaction.id,
                    command = ?interaction.data.as_ref().map(|d| d.name.clone()),
                    "Received interaction",
                );
                let _ = self
                    .out_tx
                    .send(GatewayMessage::InteractionCreate(Box::new(interaction)));
            }
        }

        Ok(())
    }

    /// Marks the session established: state to ready, backoff counter reset.
    fn mark_established(&self) {
        self.shared.set_state(ConnectionState::Ready);
        self.shared.reconnect_attempts.store(0, Ordering::Relaxed);
    }

    fn start_heartbeating(&mut self, interval_ms: u64) {
        if let Some(task) = self.heartbeat_task.take() {
            tracing::debug!("Cancelling existing heartbeat task");
            task.abort();
        }
        self.heartbeat_task = Some(spawn_heartbeat(
            self.cmd_tx.clone(),
            interval_ms,
            self.shared.settings.heartbeat_timeout,
        ));
    }

    async fn send_heartbeat(&mut self) -> Result<(), GatewayError> {
        let sequence = self.shared.session.read().await.sequence;
        tracing::debug!(?sequence, "Sending heartbeat");
        let data = sequence.map_or(Value::Null, Value::from);
        self.send_frame(OpCode::Heartbeat, Some(data)).await
    }

    async fn send_frame(&mut self, opcode: OpCode, data: Option<Value>) -> Result<(), GatewayError> {
        let frame = GatewayFrame::outbound(opcode, data);
        let payload = serde_json::to_string(&frame)?;
        tracing::trace!(payload = %payload, "Sending frame");
        self.ws
            .send(WsMessage::Text(payload.into()))
            .await
            .map_err(|e| GatewayError::Send(e.to_string()))
    }

    async fn send_close(&mut self, code: u16, reason: &str) {
        tracing::info!(code, reason, "Closing Gateway connection");
        let frame = CloseFrame {
            code: CloseCode::from(code),
            reason: reason.to_string().into(),
        };
        if let Err(e) = self.ws.send(WsMessage::Close(Some(frame))).await {
            // Abrupt abort: the socket drops with the handler.
            tracing::error!(error = %e, "Cannot close Gateway connection cleanly");
        }
    }
}
