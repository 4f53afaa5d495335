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

//! Bot token storage for Discord authentication.

use core::fmt::Debug;

/// Bot token credential used for both REST authorization and the Gateway identify handshake.
#[derive(Clone)]
pub struct Credential {
    token: Box<str>,
}

impl Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(stringify!(Credential))
            .field("token", &self.masked_token())
            .finish()
    }
}

impl Credential {
    /// Creates a new [`Credential`] from a bot token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into().into_boxed_str(),
        }
    }

    /// Returns the raw bot token.
    ///
    /// The token should be handled carefully and never logged or exposed.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Returns the value for the `Authorization` HTTP header.
    #[must_use]
    pub fn authorization(&self) -> String {
        format!("Bot {}", self.token)
    }

    /// Returns a masked version of the token for logging purposes.
    ///
    /// Shows first 4 and last 4 characters with ellipsis in between.
    /// For tokens shorter than 8 characters, shows asterisks only.
    #[must_use]
    pub fn masked_token(&self) -> String {
        let token = self.token.as_ref();
        let len = token.len();

        if len <= 8 {
            "*".repeat(len)
        } else {
            format!("{}...{}", &token[..4], &token[len - 4..])
        }
    }
}
