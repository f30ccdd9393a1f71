// SPDX-License-Identifier: MIT

//! `wharfd` library surface: re-exported so integration tests and the
//! binary share the same module tree.

pub mod env;
pub mod listener;
pub mod rest;
