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

//! Discord HTTP client implementation.

use std::{collections::HashMap, time::Duration};

use reqwest::Method;
use serde_json::Value;

use super::{
    error::{DiscordHttpError, DiscordHttpResult},
    models::{
        ApplicationCommand, GetGatewayResponse, InteractionResponse, Message, RateLimitBody,
        RateLimitBucket, WebhookMessage,
    },
    query::ExecuteWebhookParams,
};
use crate::{
    common::{
        consts::{DISCORD_RELAY_IDENT, HTTP_TRANSPORT_RETRY_DELAY_SECS, RATE_LIMIT_MAX_RETRIES},
        credential::Credential,
    },
    config::DiscordRelayConfig,
};

/// Generic HTTP request primitive with timeouts and transport-failure retry.
///
/// Transport-level failures (timeout, connection refused, unresolved address)
/// are retried indefinitely after a fixed delay: the relay should survive
/// outages on the remote side rather than give up. Protocol-level failures are
/// returned to the caller.
#[derive(Debug, Clone)]
pub struct RelayHttpClient {
    client: reqwest::Client,
    transport_retry_delay: Duration,
}

impl RelayHttpClient {
    /// Creates a new [`RelayHttpClient`].
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(timeout_secs: u64, user_agent: &str) -> DiscordHttpResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(timeout_secs))
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()
            .map_err(|e| DiscordHttpError::NetworkError(e.to_string()))?;

        Ok(Self {
            client,
            transport_retry_delay: Duration::from_secs(HTTP_TRANSPORT_RETRY_DELAY_SECS),
        })
    }

    /// Overrides the delay between transport-failure retries.
    #[must_use]
    pub fn with_transport_retry_delay(mut self, delay: Duration) -> Self {
        self.transport_retry_delay = delay;
        self
    }

    /// Sends an HTTP request, retrying transport-level failures indefinitely.
    ///
    /// # Errors
    ///
    /// Returns an error for non-transport failures (request building, protocol
    /// errors); transport failures never surface.
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        headers: Option<&HashMap<String, String>>,
        body: Option<&[u8]>,
    ) -> DiscordHttpResult<reqwest::Response> {
        loop {
            let mut request = self.client.request(method.clone(), url);
            if let Some(headers) = headers {
                for (name, value) in headers {
                    request = request.header(name, value);
                }
            }
            if let Some(body) = body {
                request = request.body(body.to_vec());
            }

            tracing::debug!(%method, url, "Sending HTTP request");

            match request.send().await {
                Ok(response) => {
                    tracing::debug!(%method, url, status = response.status().as_u16(), "HTTP response");
                    return Ok(response);
                }
                Err(e) if e.is_timeout() || e.is_connect() => {
                    tracing::error!(
                        %method,
                        url,
                        error = %e,
                        "Transport failure, retrying in {}s",
                        self.transport_retry_delay.as_secs(),
                    );
                    tokio::time::sleep(self.transport_retry_delay).await;
                }
                Err(e) => return Err(DiscordHttpError::NetworkError(e.to_string())),
            }
        }
    }
}

/// Discord REST API client.
///
/// Wraps [`RelayHttpClient`] with authorization, rate limit observability, and
/// 429 retry per the server-provided budget.
#[derive(Debug, Clone)]
pub struct DiscordHttpClient {
    inner: RelayHttpClient,
    base_url: String,
    credential: Credential,
}

impl DiscordHttpClient {
    /// Creates a new [`DiscordHttpClient`] from the relay configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(config: &DiscordRelayConfig) -> DiscordHttpResult<Self> {
        let user_agent = match &config.user_agent_prefix {
            Some(prefix) if !prefix.is_empty() => format!("{prefix} {}", *DISCORD_RELAY_IDENT),
            _ => DISCORD_RELAY_IDENT.clone(),
        };
        let inner = RelayHttpClient::new(config.http_timeout_secs, &user_agent)?;

        Ok(Self {
            inner,
            base_url: config.http_base_url(),
            credential: Credential::new(config.bot_token.clone()),
        })
    }

    /// Returns the versioned REST base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Overrides the delay between transport-failure retries.
    #[must_use]
    pub fn with_transport_retry_delay(mut self, delay: Duration) -> Self {
        self.inner = self.inner.with_transport_retry_delay(delay);
        self
    }

    /// Sends an authorized request to a REST endpoint and parses the response body.
    ///
    /// HTTP 429 responses are retried after the server-specified delay, up to
    /// [`RATE_LIMIT_MAX_RETRIES`] times. HTTP 204 yields `Value::Null`.
    async fn request(
        &self,
        method: Method,
        endpoint: &str,
        payload: Option<&Value>,
    ) -> DiscordHttpResult<Value> {
        let url = format!("{}/{endpoint}", self.base_url);

        let mut headers = HashMap::new();
        headers.insert("Accept".to_string(), "application/json; */*".to_string());
        headers.insert("Authorization".to_string(), self.credential.authorization());

        let body = match payload {
            Some(payload) => {
                headers.insert(
                    "Content-Type".to_string(),
                    "application/json; charset=utf-8".to_string(),
                );
                Some(serde_json::to_vec(payload)?)
            }
            None => None,
        };

        let mut retries = 0u32;

        loop {
            let response = self
                .inner
                .request(method.clone(), &url, Some(&headers), body.as_deref())
                .await?;

            let status = response.status();
            let bucket = RateLimitBucket::parse(response.headers());
            tracing::debug!(
                %method,
                url,
                remaining = ?bucket.remaining,
                limit = ?bucket.limit,
                bucket = ?bucket.bucket_id,
                reset_after_secs = ?bucket.reset_after_secs,
                "Rate limit budget",
            );

            if status.as_u16() == 429 {
                let raw = response
                    .text()
                    .await
                    .map_err(|e| DiscordHttpError::NetworkError(e.to_string()))?;
                let rate_limit: RateLimitBody = serde_json::from_str(&raw)?;

                if retries >= RATE_LIMIT_MAX_RETRIES {
                    tracing::error!(%method, url, retries, "Rate limit retries exhausted");
                    return Err(DiscordHttpError::RateLimitExhausted {
                        method: method.to_string(),
                        url,
                        retries,
                    });
                }

                tracing::warn!(
                    %method,
                    url,
                    global = rate_limit.global || bucket.is_global,
                    scope = ?bucket.scope,
                    bucket = ?bucket.bucket_id,
                    "Rate limited, retrying in {}s",
                    rate_limit.retry_after,
                );
                tokio::time::sleep(Duration::from_secs_f64(rate_limit.retry_after.max(0.0))).await;
                retries += 1;
                continue;
            }

            if !status.is_success() {
                return Err(DiscordHttpError::UnexpectedStatus {
                    method: method.to_string(),
                    url,
                    status: status.as_u16(),
                });
            }

            if status.as_u16() == 204 {
                return Ok(Value::Null);
            }

            let raw = response
                .text()
                .await
                .map_err(|e| DiscordHttpError::NetworkError(e.to_string()))?;
            return Ok(serde_json::from_str(&raw)?);
        }
    }

    /// Fetches the Gateway WebSocket endpoint for this bot.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be parsed.
    pub async fn get_gateway(&self) -> DiscordHttpResult<GetGatewayResponse> {
        let value = self.request(Method::GET, "gateway/bot", None).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Executes a webhook and returns the created message.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be parsed.
    pub async fn execute_webhook(
        &self,
        webhook_id: &str,
        webhook_token: &str,
        thread_id: Option<&str>,
        message: &WebhookMessage,
    ) -> DiscordHttpResult<Message> {
        let mut params = ExecuteWebhookParams::waiting();
        if let Some(thread_id) = thread_id {
            params = params.with_thread_id(thread_id);
        }
        let endpoint = format!(
            "webhooks/{webhook_id}/{webhook_token}{}",
            params.to_query_string()
        );

        let value = self
            .request(Method::POST, &endpoint, Some(&serde_json::to_value(message)?))
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Executes a webhook without waiting for the created message.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn execute_webhook_detached(
        &self,
        webhook_id: &str,
        webhook_token: &str,
        thread_id: Option<&str>,
        message: &WebhookMessage,
    ) -> DiscordHttpResult<()> {
        let mut params = ExecuteWebhookParams::detached();
        if let Some(thread_id) = thread_id {
            params = params.with_thread_id(thread_id);
        }
        let endpoint = format!(
            "webhooks/{webhook_id}/{webhook_token}{}",
            params.to_query_string()
        );

        self.request(Method::POST, &endpoint, Some(&serde_json::to_value(message)?))
            .await?;
        Ok(())
    }

    /// Replaces all global application commands with the given set.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be parsed.
    pub async fn bulk_overwrite_commands(
        &self,
        application_id: &str,
        commands: &[ApplicationCommand],
    ) -> DiscordHttpResult<Vec<ApplicationCommand>> {
        for command in commands {
            tracing::info!(name = %command.name, "Registering application command");
        }

        let endpoint = format!("applications/{application_id}/commands");
        let value = self
            .request(Method::PUT, &endpoint, Some(&serde_json::to_value(commands)?))
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Responds to an interaction callback.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn respond_to_interaction(
        &self,
        interaction_id: &str,
        interaction_token: &str,
        response: &InteractionResponse,
    ) -> DiscordHttpResult<()> {
        let endpoint = format!("interactions/{interaction_id}/{interaction_token}/callback");
        self.request(Method::POST, &endpoint, Some(&serde_json::to_value(response)?))
            .await?;
        Ok(())
    }
}
