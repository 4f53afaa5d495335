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

//! Error types for the Discord HTTP clients.

use thiserror::Error;

/// A typed error enumeration for the Discord HTTP clients.
#[derive(Debug, Clone, Error)]
pub enum DiscordHttpError {
    /// Any non-2xx HTTP status other than 429.
    #[error("{method} '{url}' -> {status}")]
    UnexpectedStatus {
        /// Request method.
        method: String,
        /// Request URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },
    /// A rate limited request exhausted its retry budget.
    #[error("Rate limit retries exhausted for {method} '{url}' after {retries} retries")]
    RateLimitExhausted {
        /// Request method.
        method: String,
        /// Request URL.
        url: String,
        /// Number of retries performed.
        retries: u32,
    },
    /// Failure during JSON serialization/deserialization.
    #[error("JSON error: {0}")]
    JsonError(String),
    /// Non-transient network error (transient ones are retried internally).
    #[error("Network error: {0}")]
    NetworkError(String),
}

impl From<serde_json::Error> for DiscordHttpError {
    fn from(error: serde_json::Error) -> Self {
        Self::JsonError(error.to_string())
    }
}

/// Result type alias for Discord HTTP operations.
pub type DiscordHttpResult<T> = Result<T, DiscordHttpError>;

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn test_unexpected_status_display() {
        let error = DiscordHttpError::UnexpectedStatus {
            method: "POST".to_string(),
            url: "https://discord.com/api/v10/webhooks/1/t".to_string(),
            status: 403,
        };
        assert_eq!(
            error.to_string(),
            "POST 'https://discord.com/api/v10/webhooks/1/t' -> 403"
        );
    }

    #[rstest]
    fn test_from_json_error() {
        let json_err =
            serde_json::from_str::<serde_json::Value>("not json").expect_err("should fail");
        let error = DiscordHttpError::from(json_err);
        assert!(matches!(error, DiscordHttpError::JsonError(_)));
    }
}
