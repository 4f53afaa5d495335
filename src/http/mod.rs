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

//! HTTP clients for the Discord REST API.
//!
//! Two layers:
//! - [`client::RelayHttpClient`]: generic request primitive with timeouts and
//!   indefinite retry of transport-level failures
//! - [`client::DiscordHttpClient`]: protocol layer attaching authorization,
//!   observing rate limit headers, and retrying HTTP 429 per the server budget

pub mod client;
pub mod error;
pub mod models;
pub mod query;

pub use client::{DiscordHttpClient, RelayHttpClient};
pub use error::{DiscordHttpError, DiscordHttpResult};
