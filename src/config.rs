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

//! Configuration for the Discord relay clients.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::common::consts::{DISCORD_API_VERSION, DISCORD_HTTP_URL};

/// Configuration for the Discord relay clients.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DiscordRelayConfig {
    /// Bot token used for REST authorization and the Gateway identify handshake.
    pub bot_token: String,
    /// Application id owning the registered slash commands.
    pub application_id: String,
    /// Guild (server) id whose role data is cached from guild snapshots.
    pub guild_id: String,
    /// Channel id the relay bridges.
    pub channel_id: String,
    /// Webhook id used for outbound relay messages.
    pub webhook_id: String,
    /// Webhook token used for outbound relay messages.
    pub webhook_token: String,
    /// Optional override for the REST base URL (testing/sandbox).
    pub base_url_http: Option<String>,
    /// Optional override for the Gateway URL, skipping endpoint discovery.
    pub base_url_gateway: Option<String>,
    /// Discord API version for REST and Gateway connections.
    pub api_version: u8,
    /// Connect/request timeout in seconds for HTTP and socket establishment.
    pub http_timeout_secs: u64,
    /// Deadline in seconds for a heartbeat acknowledgement.
    pub heartbeat_timeout_secs: u64,
    /// Optional prefix prepended to the HTTP `User-Agent` header.
    pub user_agent_prefix: Option<String>,
}

impl Default for DiscordRelayConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            application_id: String::new(),
            guild_id: String::new(),
            channel_id: String::new(),
            webhook_id: String::new(),
            webhook_token: String::new(),
            base_url_http: None,
            base_url_gateway: None,
            api_version: DISCORD_API_VERSION,
            http_timeout_secs: 30,
            heartbeat_timeout_secs: 15,
            user_agent_prefix: None,
        }
    }
}

impl DiscordRelayConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if a bot token is configured.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.bot_token.is_empty()
    }

    /// Returns `true` if both webhook id and token are configured.
    #[must_use]
    pub fn has_webhook(&self) -> bool {
        !self.webhook_id.is_empty() && !self.webhook_token.is_empty()
    }

    /// Returns the versioned REST base URL, considering overrides.
    #[must_use]
    pub fn http_base_url(&self) -> String {
        let base = self
            .base_url_http
            .clone()
            .unwrap_or_else(|| DISCORD_HTTP_URL.to_string());
        format!("{base}/v{}", self.api_version)
    }

    /// Loads the configuration from a JSON file, writing the default when missing.
    ///
    /// Mirrors the behavior relay operators expect: a first run creates a template
    /// file to fill in rather than failing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, written, or parsed.
    pub fn load_or_create(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            let config = Self::default();
            let raw = serde_json::to_string_pretty(&config)?;
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, raw)?;
            tracing::info!(path = %path.display(), "Created default configuration file");
            return Ok(config);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
        let config = serde_json::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("failed to parse {}: {e}", path.display()))?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }
}
