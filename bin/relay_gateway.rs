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

//! Connects to the Discord Gateway and streams relay events to the log.
//! Useful when manually validating the Gateway client implementation.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin relay-gateway -- [config-path]
//! ```
//!
//! On first run a default `discordrelay.json` is written next to the binary;
//! fill in the bot token, guild id, and webhook credentials before running
//! again.

use std::{env, path::PathBuf, sync::Arc};

use discord_relay::{
    config::DiscordRelayConfig,
    http::{
        client::DiscordHttpClient,
        models::{ApplicationCommand, CommandOption, InteractionResponse},
    },
    websocket::{client::DiscordGatewayClient, messages::GatewayMessage},
};
use futures_util::StreamExt;
use tokio::{pin, signal};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config_path = env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from("discordrelay.json"), PathBuf::from);
    let config = DiscordRelayConfig::load_or_create(&config_path)?;

    if !config.has_credentials() {
        anyhow::bail!(
            "No bot token configured; fill in {} and run again",
            config_path.display()
        );
    }

    let http = Arc::new(DiscordHttpClient::new(&config)?);

    if !config.application_id.is_empty() {
        let commands = vec![
            ApplicationCommand::chat_input(
                "whitelist",
                "Whitelist a player on the game server",
                vec![CommandOption::string(
                    "username",
                    "The username to whitelist",
                    true,
                )],
            ),
            ApplicationCommand::chat_input("list", "List the currently online players", vec![]),
        ];
        http.bulk_overwrite_commands(&config.application_id, &commands)
            .await?;
    }

    let mut gateway = DiscordGatewayClient::new(&config, http.clone());
    gateway.connect().await?;

    let stream = gateway.stream();
    let shutdown = signal::ctrl_c();
    pin!(stream);
    pin!(shutdown);

    tracing::info!("Streaming Gateway events; press Ctrl+C to exit");

    loop {
        tokio::select! {
            Some(event) = stream.next() => match event {
                GatewayMessage::Ready(user) => {
                    tracing::info!(username = %user.username, "Connected and ready");
                }
                GatewayMessage::Resumed => {
                    tracing::info!("Session resumed");
                }
                GatewayMessage::MessageCreate(message) => {
                    tracing::info!(
                        channel_id = %message.channel_id,
                        author = %message.author.username,
                        content = %message.content,
                        "Message",
                    );
                }
                GatewayMessage::GuildRoles { guild_id, roles } => {
                    tracing::info!(guild_id = %guild_id, roles = roles.len(), "Guild role snapshot");
                }
                GatewayMessage::InteractionCreate(interaction) => {
                    let command = interaction
                        .data
                        .as_ref()
                        .map_or("<none>", |data| data.name.as_str());
                    tracing::info!(command, "Interaction");
                    http.respond_to_interaction(
                        &interaction.id,
                        &interaction.token,
                        &InteractionResponse::ephemeral_text("Not wired to a game server."),
                    )
                    .await?;
                }
            },
            _ = &mut shutdown => {
                tracing::info!("Shutting down");
                gateway.close(1000, "Server stopping.", true).await;
                break;
            }
        }
    }

    Ok(())
}
