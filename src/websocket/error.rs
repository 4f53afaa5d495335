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

//! Gateway client error types.

use thiserror::Error;
use tokio_tungstenite::tungstenite;

use crate::http::error::DiscordHttpError;

/// Error types for the Gateway client.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// Client is not connected.
    #[error("Not connected")]
    NotConnected,
    /// Transport-level error during WebSocket communication.
    #[error("Transport error: {0}")]
    Transport(String),
    /// Failed to send a frame over the WebSocket.
    #[error("Send error: {0}")]
    Send(String),
    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(String),
    /// A frame that requires a payload arrived without one.
    #[error("Received Gateway frame '{0}' without data")]
    MissingPayload(String),
    /// Connection or handshake timeout.
    #[error("Timeout: {0}")]
    Timeout(String),
    /// REST error while fetching the Gateway endpoint.
    #[error("HTTP error: {0}")]
    Http(#[from] DiscordHttpError),
}

impl From<tungstenite::Error> for GatewayError {
    fn from(error: tungstenite::Error) -> Self {
        Self::Transport(error.to_string())
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(error: serde_json::Error) -> Self {
        Self::Json(error.to_string())
    }
}

/// Result type alias for Gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;
