//! # stepwise-domain
//!
//! Pure domain model for the stepwise desktop automation tool.
//!
//! ## Responsibilities
//! - Foundational types: step identifiers, timestamps, error conventions
//! - Define **Steps** (mouse/keyboard actions, statements owning nested
//!   steps, variable operations) and the **Step tree** holding them
//! - Define **Variables** and the case-insensitive **Environment**
//! - Define the persisted **Automation document** and its strict validator
//! - Derive file names from automation titles
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod document;
pub mod slug;
pub mod step;
pub mod tree;
pub mod variable;
