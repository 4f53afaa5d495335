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

//! Data structures for Gateway frames and dispatch payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::GatewayError;
use crate::{
    common::enums::OpCode,
    http::models::{Member, Message, Role, User},
};

/// Gateway frame envelope.
///
/// Every frame in both directions uses this shape. The opcode is kept raw so
/// unrecognized values pass through decoding and can be ignored at dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayFrame {
    /// Frame opcode.
    pub op: u8,
    /// Opcode-specific payload.
    #[serde(default)]
    pub d: Option<Value>,
    /// Sequence number, present on dispatch frames.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s: Option<u64>,
    /// Dispatch event name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<String>,
}

impl GatewayFrame {
    /// Creates an outbound frame (no sequence or event name).
    #[must_use]
    pub fn outbound(opcode: OpCode, data: Option<Value>) -> Self {
        Self {
            op: opcode.as_u8(),
            d: data,
            s: None,
            t: None,
        }
    }
}

/// Parses a raw JSON frame.
///
/// # Errors
///
/// Returns an error if the text is not a valid frame envelope.
pub fn parse_frame(text: &str) -> Result<GatewayFrame, GatewayError> {
    serde_json::from_str(text).map_err(|e| GatewayError::Json(e.to_string()))
}

/// Hello payload carrying the heartbeat cadence.
#[derive(Debug, Clone, Deserialize)]
pub struct Hello {
    /// Heartbeat interval in milliseconds.
    pub heartbeat_interval: u64,
}

/// Connection metadata sent with identify.
#[derive(Debug, Clone, Serialize)]
pub struct IdentifyProperties {
    /// Operating system name.
    pub os: String,
    /// Library identification.
    pub browser: String,
    /// Device identification.
    pub device: String,
}

/// Identify payload establishing a new session.
#[derive(Debug, Clone, Serialize)]
pub struct Identify {
    /// Bot token.
    pub token: String,
    /// Requested gateway intents.
    pub intents: u64,
    /// Connection metadata.
    pub properties: IdentifyProperties,
}

/// Resume payload re-attaching to an existing session.
#[derive(Debug, Clone, Serialize)]
pub struct Resume {
    /// Bot token.
    pub token: String,
    /// Session identifier from the ready payload.
    pub session_id: String,
    /// Last sequence number seen.
    pub seq: u64,
}

/// Ready dispatch payload.
#[derive(Debug, Clone, Deserialize)]
pub struct Ready {
    /// The bot's own user.
    pub user: User,
    /// Session identifier for resuming.
    pub session_id: String,
    /// Endpoint to use when resuming this session.
    #[serde(default)]
    pub resume_gateway_url: Option<String>,
}

/// Guild snapshot dispatch payload, reduced to the role data the relay uses.
#[derive(Debug, Clone, Deserialize)]
pub struct GuildCreate {
    /// Guild id.
    pub id: String,
    /// Guild name.
    #[serde(default)]
    pub name: Option<String>,
    /// Guild roles.
    #[serde(default)]
    pub roles: Vec<Role>,
}

/// A selected option value of an invoked command.
#[derive(Debug, Clone, Deserialize)]
pub struct InteractionOption {
    /// Option name.
    pub name: String,
    /// Option value.
    #[serde(default)]
    pub value: Option<Value>,
}

impl InteractionOption {
    /// Returns the option value as a string, when it is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.value.as_ref().and_then(Value::as_str)
    }
}

/// Invoked command data on an interaction.
#[derive(Debug, Clone, Deserialize)]
pub struct InteractionData {
    /// Command name.
    pub name: String,
    /// Command type.
    #[serde(rename = "type")]
    pub kind: u8,
    /// Selected options.
    #[serde(default)]
    pub options: Vec<InteractionOption>,
}

/// Interaction create dispatch payload.
#[derive(Debug, Clone, Deserialize)]
pub struct Interaction {
    /// Interaction id, used for the response callback.
    pub id: String,
    /// Interaction type (2 = application command).
    #[serde(rename = "type")]
    pub kind: u8,
    /// Continuation token for the response callback.
    pub token: String,
    /// Invoked command data.
    #[serde(default)]
    pub data: Option<InteractionData>,
    /// Guild the interaction was invoked in.
    #[serde(default)]
    pub guild_id: Option<String>,
    /// Channel the interaction was invoked in.
    #[serde(default)]
    pub channel_id: Option<String>,
    /// Invoking guild member.
    #[serde(default)]
    pub member: Option<Member>,
    /// Invoking user, for interactions outside guilds.
    #[serde(default)]
    pub user: Option<User>,
}

/// Interaction type: application command invocation.
pub const INTERACTION_TYPE_APPLICATION_COMMAND: u8 = 2;

/// Domain events forwarded to external consumers.
///
/// Protocol bookkeeping (hello, heartbeats, reconnects) is handled internally;
/// only dispatch events relevant to the relay surface here.
#[derive(Debug, Clone)]
pub enum GatewayMessage {
    /// Session established; carries the bot's own user.
    Ready(Box<User>),
    /// Session resumed after a reconnect.
    Resumed,
    /// A message was posted in a channel.
    MessageCreate(Box<Message>),
    /// Role snapshot for the configured guild, indexed upstream by role id.
    GuildRoles {
        /// Guild the snapshot belongs to.
        guild_id: String,
        /// The guild's roles.
        roles: Vec<Role>,
    },
    /// A user invoked an application command.
    InteractionCreate(Box<Interaction>),
}
