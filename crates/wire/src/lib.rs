// SPDX-License-Identifier: MIT

//! Typed, length-prefixed JSON request/response protocol between `wharfd`
//! and control-plane clients. The "gRPC-style service" of the control-plane
//! surface: a typed RPC contract over a custom framed socket, not literal
//! Protocol Buffers.

mod request;
mod response;
mod wire;

pub use request::Request;
pub use response::Response;
pub use wire::{decode, encode, read_message, read_request, write_message, write_response, ProtocolError, MAX_MESSAGE_BYTES};
