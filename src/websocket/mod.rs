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
//! This module provides a two-layer WebSocket client architecture:
//! - Outer client: orchestrator owning session continuity and reconnection
//! - Inner handler: I/O boundary running in a dedicated Tokio task
//!
//! Features:
//! - Identify/resume handshake with session continuity rules
//! - Heartbeating with acknowledgement deadlines and jittered start
//! - Reconnection with exponential backoff, resume-aware endpoint choice
//! - Opcode/event dispatch with default-ignore forward compatibility

pub mod client;
pub mod error;
pub mod messages;
pub mod session;

pub(crate) mod handler;
pub(crate) mod heartbeat;

pub use client::DiscordGatewayClient;
pub use error::{GatewayError, GatewayResult};
pub use messages::GatewayMessage;
pub use session::Session;
