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

//! Enumerations for Gateway opcodes, dispatch events, close codes, and connection state.

use strum::{AsRefStr, Display, EnumIter, EnumString};

/// WebSocket close code for a normal closure.
pub const CLOSE_CODE_NORMAL: u16 = 1000;

/// WebSocket close code signalling the endpoint is going away.
pub const CLOSE_CODE_GOING_AWAY: u16 = 1001;

/// Returns whether a Gateway close code permits resuming the session.
///
/// Per the Gateway protocol, codes in `[4000, 4003]` and `[4005, 4009]` leave the
/// session intact; everything else (including normal closures) requires a fresh
/// identify.
#[must_use]
pub const fn is_resumable_close_code(code: u16) -> bool {
    matches!(code, 4000..=4003 | 4005..=4009)
}

/// Gateway frame opcodes.
///
/// Only the opcodes this client sends or handles are enumerated; frames carrying
/// any other opcode are ignored for forward compatibility.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash, AsRefStr, EnumIter)]
#[repr(u8)]
pub enum OpCode {
    /// Named dispatch event (receive).
    Dispatch = 0,
    /// Keep-alive heartbeat (send, or server-requested receive).
    Heartbeat = 1,
    /// Initial handshake establishing a new session (send).
    Identify = 2,
    /// Re-attach to an existing session (send).
    Resume = 6,
    /// Server instruction to reconnect (receive).
    Reconnect = 7,
    /// Session invalidated by the server (receive).
    InvalidSession = 9,
    /// Connection greeting carrying the heartbeat interval (receive).
    Hello = 10,
    /// Heartbeat acknowledgement (receive).
    HeartbeatAck = 11,
}

impl OpCode {
    /// Returns the wire representation of this opcode.
    #[must_use]
    pub const fn as_u8(&self) -> u8 {
        *self as u8
    }

    /// Parses a wire opcode, returning `None` for unrecognized values.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Dispatch),
            1 => Some(Self::Heartbeat),
            2 => Some(Self::Identify),
            6 => Some(Self::Resume),
            7 => Some(Self::Reconnect),
            9 => Some(Self::InvalidSession),
            10 => Some(Self::Hello),
            11 => Some(Self::HeartbeatAck),
            _ => None,
        }
    }
}

/// Dispatch event names this client consumes.
///
/// Unrecognized names fail to parse and are ignored by the handler.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash, AsRefStr, EnumIter, EnumString)]
pub enum DispatchEvent {
    /// Session established; carries session id, resume URL, and own identity.
    #[strum(serialize = "READY")]
    Ready,
    /// Session resumed after a reconnect.
    #[strum(serialize = "RESUMED")]
    Resumed,
    /// A message was posted in a channel.
    #[strum(serialize = "MESSAGE_CREATE")]
    MessageCreate,
    /// Guild snapshot including role data.
    #[strum(serialize = "GUILD_CREATE")]
    GuildCreate,
    /// A user invoked an application command.
    #[strum(serialize = "INTERACTION_CREATE")]
    InteractionCreate,
}

/// Authoritative connection state for the Gateway client.
///
/// A single atomic field holds one of these values; the supervisor and the
/// connection handler drive all transitions, which eliminates the races a
/// shared "already reconnecting" flag would allow.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash, AsRefStr, EnumIter)]
#[repr(u8)]
pub enum ConnectionState {
    /// No connection and none in progress.
    Disconnected = 0,
    /// Waiting out the backoff delay before the next attempt.
    Reconnecting = 1,
    /// Transport connection in progress.
    Connecting = 2,
    /// Socket open, waiting for the hello frame.
    AwaitingHello = 3,
    /// Identify or resume sent, waiting for the session to establish.
    Authenticating = 4,
    /// Session established and heartbeating.
    Ready = 5,
    /// Deliberate shutdown in progress.
    Closing = 6,
}

impl ConnectionState {
    /// Returns the atomic representation of this state.
    #[must_use]
    pub const fn as_u8(&self) -> u8 {
        *self as u8
    }

    /// Converts an atomic representation back into a state.
    ///
    /// # Panics
    ///
    /// Panics if `value` does not correspond to a state; values only ever
    /// originate from [`Self::as_u8`].
    #[must_use]
    pub const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Disconnected,
            1 => Self::Reconnecting,
            2 => Self::Connecting,
            3 => Self::AwaitingHello,
            4 => Self::Authenticating,
            5 => Self::Ready,
            6 => Self::Closing,
            _ => panic!("invalid ConnectionState value"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rstest::rstest;
    use strum::IntoEnumIterator;

    use super::*;

    #[rstest]
    fn test_opcode_roundtrip() {
        for opcode in OpCode::iter() {
            assert_eq!(OpCode::from_u8(opcode.as_u8()), Some(opcode));
        }
    }

    #[rstest]
    fn test_opcode_unknown() {
        assert_eq!(OpCode::from_u8(3), None);
        assert_eq!(OpCode::from_u8(42), None);
    }

    #[rstest]
    #[case(4000, true)]
    #[case(4003, true)]
    #[case(4004, false)] // authentication failed: session is gone
    #[case(4005, true)]
    #[case(4009, true)]
    #[case(4010, false)]
    #[case(CLOSE_CODE_NORMAL, false)]
    #[case(CLOSE_CODE_GOING_AWAY, false)]
    fn test_resumable_close_codes(#[case] code: u16, #[case] expected: bool) {
        assert_eq!(is_resumable_close_code(code), expected);
    }

    #[rstest]
    fn test_dispatch_event_from_name() {
        assert_eq!(
            DispatchEvent::from_str("MESSAGE_CREATE").unwrap(),
            DispatchEvent::MessageCreate
        );
        assert_eq!(
            DispatchEvent::from_str("READY").unwrap(),
            DispatchEvent::Ready
        );
        assert!(DispatchEvent::from_str("TYPING_START").is_err());
    }

    #[rstest]
    fn test_connection_state_roundtrip() {
        for state in ConnectionState::iter() {
            assert_eq!(ConnectionState::from_u8(state.as_u8()), state);
        }
    }
}
