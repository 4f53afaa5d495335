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

//! Session continuity state and reconnect backoff.

use std::time::Duration;

/// Session continuity state for one logical Gateway session.
///
/// `session_id` and `resume_gateway_url` are set only by a successful ready
/// dispatch and cleared whenever a fresh identify is started. The sequence
/// number tracks the most recent dispatch seen and is echoed in heartbeats
/// and resume requests.
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Identifier of the established session, for resuming.
    pub session_id: Option<String>,
    /// Endpoint to reconnect to when resuming.
    pub resume_gateway_url: Option<String>,
    /// Last sequence number carried by an inbound dispatch frame.
    pub sequence: Option<u64>,
    /// Whether the next hello should attempt a resume.
    pub should_resume: bool,
}

impl Session {
    /// Records the sequence number of an inbound frame.
    pub fn update_sequence(&mut self, sequence: u64) {
        tracing::trace!(from = ?self.sequence, to = sequence, "Updated sequence number");
        self.sequence = Some(sequence);
    }

    /// Captures session identity from a ready dispatch.
    pub fn capture_ready(&mut self, session_id: String, resume_gateway_url: Option<String>) {
        tracing::debug!(
            session_id = %session_id,
            resume_gateway_url = ?resume_gateway_url,
            "Captured session for resuming",
        );
        self.session_id = Some(session_id);
        self.resume_gateway_url = resume_gateway_url;
    }

    /// Returns the resume parameters when both a session id and sequence exist.
    #[must_use]
    pub fn resume_context(&self) -> Option<(String, u64)> {
        match (&self.session_id, self.sequence) {
            (Some(session_id), Some(sequence)) => Some((session_id.clone(), sequence)),
            _ => None,
        }
    }

    /// Returns whether a resume is currently possible.
    #[must_use]
    pub fn can_resume(&self) -> bool {
        self.session_id.is_some() && self.sequence.is_some()
    }

    /// Clears stale session identity ahead of a fresh identify.
    pub fn clear_handshake(&mut self) {
        self.session_id = None;
        self.resume_gateway_url = None;
    }

    /// Resets all session state after a connection error.
    pub fn reset(&mut self) {
        self.session_id = None;
        self.resume_gateway_url = None;
        self.sequence = None;
        self.should_resume = false;
    }
}

/// Returns the backoff delay before reconnect attempt number `attempt_count`.
///
/// The delay doubles with each consecutive failure (`2^n` seconds) and is
/// applied before every attempt, including the first. The counter resets to
/// zero once a session establishes, so the exponent only grows during an
/// unbroken failure streak.
#[must_use]
pub fn reconnect_backoff(attempt_count: u32) -> Duration {
    Duration::from_millis(2u64.saturating_pow(attempt_count).saturating_mul(1000))
}
