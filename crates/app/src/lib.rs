//! # stepwise-app
//!
//! Application layer: use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `InputBackend`: pointer and keyboard injection
//!   - `AutomationRepository`: storage of automation documents
//! - Define **driving/inbound** use-cases:
//!   - `Interpreter`: runs a step tree against an input backend
//!   - `EditorSession`: edits a step tree and its variables, runs it
//!   - `AutomationService`: save, load, list and delete automations
//! - Orchestrate domain objects without knowing *how* persistence or IO works
//!
//! ## Dependency rule
//! Depends on `stepwise-domain` only (plus `tokio` timers and
//! `tokio-util` cancellation tokens).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod interpreter;
pub mod ports;
pub mod services;

#[cfg(test)]
mod testing;
