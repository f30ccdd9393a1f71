// SPDX-License-Identifier: MIT

//! The Session Registry: the authoritative, lock-protected map of session
//! records, with an optional append-only durable mirror on disk.

pub mod durable;
pub mod registry;

pub use durable::DurableMirror;
pub use registry::{Page, RegistryError, SessionRegistry};
