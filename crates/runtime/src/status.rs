// SPDX-License-Identifier: MIT

/// The runtime's last observed view of a session's backing unit.
/// Mirrors [`wharf_core::SessionStatus`] but is the adapter's own vocabulary
/// — the Lifecycle Manager copies these fields onto the session record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeStatus {
    pub unit_name: Option<String>,
    pub volume_name: Option<String>,
    pub internal_endpoint: Option<String>,
    pub ready: bool,
    pub ready_at: Option<u64>,
    pub message: Option<String>,
}
