// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use wharf_core::Session;

/// Response from `wharfd` to a control-plane client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Response {
    Pong,

    Health {
        serving: bool,
        active_sessions: usize,
        adapter: String,
    },

    Session {
        session: Session,
    },

    Sessions {
        sessions: Vec<Session>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        next_page_token: Option<String>,
    },

    Deleted,

    ProxyHttp {
        status: u16,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
    },

    ProxyStreamFrame {
        data: Vec<u8>,
    },

    ProxyStreamClosed,

    /// `kind` mirrors `wharf_core::ErrorKind`'s variant name so clients can
    /// classify failures without depending on `wharf-core` directly.
    Error {
        kind: String,
        message: String,
    },
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
