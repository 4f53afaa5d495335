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

//! Data structures for Discord REST payloads and rate limit metadata.

use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};

/// Interaction response type: respond with a message.
pub const INTERACTION_RESPONSE_TYPE_MESSAGE: u8 = 4;

/// Message flag marking an interaction response as ephemeral.
pub const MESSAGE_FLAG_EPHEMERAL: u64 = 1 << 6;

/// Application command type: chat input (slash command).
pub const COMMAND_TYPE_CHAT_INPUT: u8 = 1;

/// Application command option type: string.
pub const COMMAND_OPTION_TYPE_STRING: u8 = 3;

/// Response from the gateway endpoint discovery call.
#[derive(Debug, Clone, Deserialize)]
pub struct GetGatewayResponse {
    /// Base URL for the Gateway WebSocket connection.
    pub url: String,
}

/// Structured body of an HTTP 429 response.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitBody {
    /// Seconds to wait before retrying.
    pub retry_after: f64,
    /// Whether the global rate limit was hit rather than a route bucket.
    #[serde(default)]
    pub global: bool,
    /// Human-readable explanation.
    #[serde(default)]
    pub message: Option<String>,
}

/// Rate limit metadata parsed from response headers.
///
/// Ephemeral, per response; logged for observability and consulted only on 429.
#[derive(Debug, Clone, Default)]
pub struct RateLimitBucket {
    /// Request limit for the bucket.
    pub limit: Option<u64>,
    /// Remaining requests in the current window.
    pub remaining: Option<u64>,
    /// Epoch timestamp at which the bucket resets.
    pub reset_at: Option<f64>,
    /// Seconds until the bucket resets.
    pub reset_after_secs: Option<f64>,
    /// Server-assigned bucket identifier.
    pub bucket_id: Option<String>,
    /// Whether the global limit applies.
    pub is_global: bool,
    /// Scope of the limit (`user`, `global`, or `shared`).
    pub scope: Option<String>,
}

impl RateLimitBucket {
    /// Parses the standard `X-RateLimit-*` response headers.
    #[must_use]
    pub fn parse(headers: &HeaderMap) -> Self {
        fn header_value<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.parse().ok())
        }

        Self {
            limit: header_value(headers, "x-ratelimit-limit"),
            remaining: header_value(headers, "x-ratelimit-remaining"),
            reset_at: header_value(headers, "x-ratelimit-reset"),
            reset_after_secs: header_value(headers, "x-ratelimit-reset-after"),
            bucket_id: header_value(headers, "x-ratelimit-bucket"),
            is_global: headers
                .get("x-ratelimit-global")
                .and_then(|value| value.to_str().ok())
                .is_some_and(|value| value == "1" || value.eq_ignore_ascii_case("true")),
            scope: header_value(headers, "x-ratelimit-scope"),
        }
    }
}

/// A Discord user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Snowflake id.
    pub id: String,
    /// Account username.
    pub username: String,
    /// Legacy discriminator (relevant for bots).
    #[serde(default)]
    pub discriminator: String,
    /// Display name.
    #[serde(default)]
    pub global_name: Option<String>,
    /// Whether the account is a bot.
    #[serde(default)]
    pub bot: Option<bool>,
    /// Whether the account belongs to the platform itself.
    #[serde(default)]
    pub system: Option<bool>,
}

/// A guild member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    /// The member's user, absent in partial member objects.
    #[serde(default)]
    pub user: Option<User>,
    /// Guild-specific nickname.
    #[serde(default)]
    pub nick: Option<String>,
    /// Role ids held by the member.
    #[serde(default)]
    pub roles: Vec<String>,
    /// ISO8601 timestamp the member joined at.
    #[serde(default)]
    pub joined_at: Option<String>,
}

impl Member {
    /// Returns the name to display for this member, preferring the nickname.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.nick.as_deref().or_else(|| {
            self.user
                .as_ref()
                .map(|user| user.global_name.as_deref().unwrap_or(&user.username))
        })
    }
}

/// A guild role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    /// Snowflake id.
    pub id: String,
    /// Role name.
    pub name: String,
    /// Role color as an RGB integer; 0 means no color.
    #[serde(default)]
    pub color: u32,
    /// Position in the role hierarchy.
    #[serde(default)]
    pub position: i64,
}

/// A channel message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Snowflake id.
    pub id: String,
    /// Channel the message was posted in.
    pub channel_id: String,
    /// Guild the message was posted in, absent for direct messages.
    #[serde(default)]
    pub guild_id: Option<String>,
    /// Message text content.
    #[serde(default)]
    pub content: String,
    /// Message author.
    pub author: User,
    /// Guild member data for the author, when in a guild.
    #[serde(default)]
    pub member: Option<Member>,
}

/// Controls which mention types a webhook message may ping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllowedMentions {
    /// Mention types allowed to ping (empty suppresses all).
    pub parse: Vec<String>,
}

impl AllowedMentions {
    /// Suppresses all mentions.
    #[must_use]
    pub fn none() -> Self {
        Self { parse: Vec::new() }
    }
}

/// An embed field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbedField {
    /// Field name.
    pub name: String,
    /// Field value.
    pub value: String,
    /// Whether the field renders inline.
    #[serde(default)]
    pub inline: bool,
}

/// An embed footer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbedFooter {
    /// Footer text.
    pub text: String,
    /// Footer icon URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

/// An embed author line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbedAuthor {
    /// Author name.
    pub name: String,
    /// Author URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Author icon URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

/// An embed thumbnail image.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbedThumbnail {
    /// Image URL.
    pub url: String,
}

/// A rich embed attached to a message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Embed {
    /// Embed title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Embed description text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Accent color as an RGB integer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    /// ISO8601 timestamp rendered in the footer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Author line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<EmbedAuthor>,
    /// Footer line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
    /// Thumbnail image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<EmbedThumbnail>,
    /// Embed fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
}

/// Payload for executing a webhook.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WebhookMessage {
    /// Message text content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Overrides the webhook's default username.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Overrides the webhook's default avatar.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// Embeds to attach.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
    /// Mention controls; defaults to suppressing all mentions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_mentions: Option<AllowedMentions>,
}

impl WebhookMessage {
    /// Creates a text message with all mentions suppressed.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            allowed_mentions: Some(AllowedMentions::none()),
            ..Default::default()
        }
    }

    /// Creates an embed message with all mentions suppressed.
    #[must_use]
    pub fn embed(embed: Embed) -> Self {
        Self {
            embeds: vec![embed],
            allowed_mentions: Some(AllowedMentions::none()),
            ..Default::default()
        }
    }

    /// Sets the username override.
    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Sets the avatar override.
    #[must_use]
    pub fn with_avatar_url(mut self, avatar_url: impl Into<String>) -> Self {
        self.avatar_url = Some(avatar_url.into());
        self
    }
}

/// An application command option.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandOption {
    /// Option name.
    pub name: String,
    /// Option description.
    pub description: String,
    /// Whether the option must be provided.
    #[serde(default)]
    pub required: bool,
    /// Option type.
    #[serde(rename = "type")]
    pub kind: u8,
}

impl CommandOption {
    /// Creates a string option.
    #[must_use]
    pub fn string(name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            required,
            kind: COMMAND_OPTION_TYPE_STRING,
        }
    }
}

/// An application (slash) command definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationCommand {
    /// Command id, present on registered commands returned by the API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Command name.
    pub name: String,
    /// Command description.
    #[serde(default)]
    pub description: String,
    /// Command options.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<CommandOption>,
    /// Command type.
    #[serde(rename = "type")]
    pub kind: u8,
}

impl ApplicationCommand {
    /// Creates a chat-input (slash) command.
    #[must_use]
    pub fn chat_input(
        name: impl Into<String>,
        description: impl Into<String>,
        options: Vec<CommandOption>,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: description.into(),
            options,
            kind: COMMAND_TYPE_CHAT_INPUT,
        }
    }
}

/// Data for a message interaction response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InteractionResponseData {
    /// Response text content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Message flags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<u64>,
}

/// Response to an interaction callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionResponse {
    /// Response type.
    #[serde(rename = "type")]
    pub kind: u8,
    /// Response data for message responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<InteractionResponseData>,
}

impl InteractionResponse {
    /// Creates a plain text message response.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            kind: INTERACTION_RESPONSE_TYPE_MESSAGE,
            data: Some(InteractionResponseData {
                content: Some(content.into()),
                flags: None,
            }),
        }
    }

    /// Creates a text response only visible to the invoking user.
    #[must_use]
    pub fn ephemeral_text(content: impl Into<String>) -> Self {
        Self {
            kind: INTERACTION_RESPONSE_TYPE_MESSAGE,
            data: Some(InteractionResponseData {
                content: Some(content.into()),
                flags: Some(MESSAGE_FLAG_EPHEMERAL),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use reqwest::header::{HeaderMap, HeaderValue};
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn test_rate_limit_bucket_parse() {
        let mut headers = HeaderMap::new();
        headers.insert("x-ratelimit-limit", HeaderValue::from_static("5"));
        headers.insert("x-ratelimit-remaining", HeaderValue::from_static("0"));
        headers.insert(
            "x-ratelimit-reset",
            HeaderValue::from_static("1470173023.123"),
        );
        headers.insert("x-ratelimit-reset-after", HeaderValue::from_static("1.2"));
        headers.insert(
            "x-ratelimit-bucket",
            HeaderValue::from_static("abcd1234"),
        );
        headers.insert("x-ratelimit-global", HeaderValue::from_static("1"));
        headers.insert("x-ratelimit-scope", HeaderValue::from_static("shared"));

        let bucket = RateLimitBucket::parse(&headers);
        assert_eq!(bucket.limit, Some(5));
        assert_eq!(bucket.remaining, Some(0));
        assert_eq!(bucket.reset_after_secs, Some(1.2));
        assert_eq!(bucket.bucket_id.as_deref(), Some("abcd1234"));
        assert!(bucket.is_global);
        assert_eq!(bucket.scope.as_deref(), Some("shared"));
    }

    #[rstest]
    fn test_rate_limit_bucket_parse_missing_headers() {
        let bucket = RateLimitBucket::parse(&HeaderMap::new());
        assert_eq!(bucket.limit, None);
        assert_eq!(bucket.remaining, None);
        assert!(!bucket.is_global);
    }

    #[rstest]
    fn test_rate_limit_body_deserialize() {
        let body: RateLimitBody =
            serde_json::from_str(r#"{"message": "You are being rate limited.", "retry_after": 1.2, "global": false}"#)
                .unwrap();
        assert!((body.retry_after - 1.2).abs() < f64::EPSILON);
        assert!(!body.global);
    }

    #[rstest]
    fn test_webhook_message_suppresses_mentions() {
        let message = WebhookMessage::text("hello @everyone").with_username("Steve");
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["content"], "hello @everyone");
        assert_eq!(json["username"], "Steve");
        assert!(json["allowed_mentions"]["parse"]
            .as_array()
            .unwrap()
            .is_empty());
        assert!(json.get("embeds").is_none());
    }

    #[rstest]
    fn test_interaction_response_ephemeral() {
        let response = InteractionResponse::ephemeral_text("done");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["type"], 4);
        assert_eq!(json["data"]["content"], "done");
        assert_eq!(json["data"]["flags"], 64);
    }

    #[rstest]
    fn test_application_command_serialize() {
        let command = ApplicationCommand::chat_input(
            "whitelist",
            "Whitelist a player",
            vec![CommandOption::string("username", "The username to whitelist", true)],
        );
        let json = serde_json::to_value(&command).unwrap();
        assert_eq!(json["type"], 1);
        assert_eq!(json["options"][0]["type"], 3);
        assert_eq!(json["options"][0]["required"], true);
        assert!(json.get("id").is_none());
    }

    #[rstest]
    fn test_member_display_name() {
        let member = Member {
            user: Some(User {
                id: "1".to_string(),
                username: "steve".to_string(),
                discriminator: "0".to_string(),
                global_name: Some("Steve".to_string()),
                bot: None,
                system: None,
            }),
            nick: None,
            roles: vec![],
            joined_at: None,
        };
        assert_eq!(member.display_name(), Some("Steve"));

        let with_nick = Member {
            nick: Some("Admin Steve".to_string()),
            ..member
        };
        assert_eq!(with_nick.display_name(), Some("Admin Steve"));
    }
}
