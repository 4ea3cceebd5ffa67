//! Shared test harnesses.
//!
//! Everything runs in-process: the provider answers associate requests from
//! a script and the discovery double serves canned documents.

#![allow(dead_code)]

mod discovery;
mod logs;
mod provider;

pub use discovery::ScriptedDiscovery;
pub use logs::{capture_logs, CapturedEvent};
pub use provider::{ProviderStep, ScriptedProvider};
