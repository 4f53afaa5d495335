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

//! Core constants for the Discord relay clients.

use std::sync::LazyLock;

/// Discord REST API base URL (unversioned).
pub const DISCORD_HTTP_URL: &str = "https://discord.com/api";

/// Discord API version used for both REST and Gateway connections.
pub const DISCORD_API_VERSION: u8 = 10;

/// Payload encoding requested on the Gateway connection.
pub const GATEWAY_ENCODING: &str = "json";

/// Fixed delay between retries of transport-level HTTP failures.
pub const HTTP_TRANSPORT_RETRY_DELAY_SECS: u64 = 30;

/// Maximum number of retries for a rate limited (HTTP 429) request.
pub const RATE_LIMIT_MAX_RETRIES: u32 = 3;

/// Library identity sent in the `User-Agent` header and identify properties.
pub static DISCORD_RELAY_IDENT: LazyLock<String> =
    LazyLock::new(|| format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")));

/// Gateway intents requested when identifying.
pub mod intents {
    /// Guild lifecycle events (guild create, role data).
    pub const GUILDS: u64 = 1 << 0;
    /// Messages posted in guild channels.
    pub const GUILD_MESSAGES: u64 = 1 << 9;
    /// Access to message content in dispatch payloads.
    pub const MESSAGE_CONTENT: u64 = 1 << 15;

    /// The intents a chat relay requires.
    pub const RELAY_INTENTS: u64 = GUILDS | GUILD_MESSAGES | MESSAGE_CONTENT;
}
