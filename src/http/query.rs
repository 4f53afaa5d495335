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

//! Query parameter builders for REST endpoints.

/// Query parameters for webhook execution.
#[derive(Debug, Clone)]
pub struct ExecuteWebhookParams {
    /// Wait for the created message and return it in the response body.
    pub wait: bool,
    /// Post into a thread of the webhook's channel.
    pub thread_id: Option<String>,
}

impl Default for ExecuteWebhookParams {
    fn default() -> Self {
        Self {
            wait: true,
            thread_id: None,
        }
    }
}

impl ExecuteWebhookParams {
    /// Creates parameters that wait for the created message.
    #[must_use]
    pub fn waiting() -> Self {
        Self::default()
    }

    /// Creates fire-and-forget parameters.
    #[must_use]
    pub fn detached() -> Self {
        Self {
            wait: false,
            thread_id: None,
        }
    }

    /// Targets a thread of the webhook's channel.
    #[must_use]
    pub fn with_thread_id(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = Some(thread_id.into());
        self
    }

    /// Renders the query string, including the leading `?`.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        match &self.thread_id {
            Some(thread_id) => format!("?wait={}&thread_id={thread_id}", self.wait),
            None => format!("?wait={}", self.wait),
        }
    }
}
