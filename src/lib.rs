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

//! Discord connectivity core for relaying game-server chat.
//!
//! This crate provides the two clients a chat relay needs to speak to Discord:
//!
//! - **Gateway client** ([`websocket::client::DiscordGatewayClient`]): a long-lived WebSocket
//!   connection to the Discord Gateway, handling the identify/resume handshake, heartbeating
//!   with acknowledgement deadlines, and reconnection with exponential backoff. Inbound
//!   dispatch events (ready, message create, guild snapshot, interaction create) are decoded
//!   and forwarded on an event stream for external consumers.
//! - **REST client** ([`http::client::DiscordHttpClient`]): rate-limit-aware HTTP requests
//!   against the Discord REST API, covering gateway endpoint discovery, webhook message
//!   execution, slash command registration, and interaction responses.
//!
//! What to do with the events (message formatting, chat broadcast, join/leave/death
//! announcements) is left to the embedding application; this crate only moves protocol
//! frames reliably in both directions.
//!
//! # Architecture
//!
//! The Gateway client uses a two-layer design:
//!
//! - Outer client: orchestrator owning session continuity and the reconnect supervisor
//! - Inner handler: per-connection I/O actor exclusively owning the socket

#![warn(rustc::all)]
#![deny(unsafe_code)]
#![deny(nonstandard_style)]
#![deny(missing_debug_implementations)]
#![deny(clippy::missing_errors_doc)]
#![deny(clippy::missing_panics_doc)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod common;
pub mod config;
pub mod http;
pub mod websocket;
