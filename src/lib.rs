//! Email triage client.
//!
//! Sends an email (file or pasted text, plus optional context) to a remote
//! classification endpoint, keeps the last results in a bounded local
//! history, and derives summary statistics from that history.

pub mod analysis;
pub mod cli;
pub mod client;
pub mod config;
pub mod events;
pub mod history;
pub mod stats;
pub mod storage;
pub mod submit;
pub mod web;
