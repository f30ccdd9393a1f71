// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use wharf_core::{OwnerId, SessionConfig, SessionId};

/// Request from a control-plane client to `wharfd`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    /// Cheap liveness ping, independent of the Runtime Adapter.
    Ping,

    /// Runtime Adapter health, active-session count, adapter identity.
    Health,

    CreateSession {
        owner: OwnerId,
        config: SessionConfig,
    },

    GetSession {
        id: SessionId,
        owner: OwnerId,
    },

    ListSessions {
        owner: OwnerId,
        page_size: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        page_token: Option<String>,
    },

    DeleteSession {
        id: SessionId,
        owner: OwnerId,
        #[serde(default)]
        force: bool,
    },

    /// Unary forward of one HTTP-shaped request to a session's endpoint.
    ProxyHttp {
        id: SessionId,
        owner: OwnerId,
        method: String,
        path: String,
        #[serde(default)]
        headers: Vec<(String, String)>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        body: Option<Vec<u8>>,
    },

    /// Open a bidirectional proxy stream; subsequent frames on the same
    /// connection are `ProxyStreamFrame` until `ProxyStreamClose`.
    ProxyStreamOpen {
        id: SessionId,
        owner: OwnerId,
    },

    ProxyStreamFrame {
        data: Vec<u8>,
    },

    ProxyStreamClose,
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
