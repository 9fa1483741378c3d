//! Core types shared by every stage of the state machine compiler.
//!
//! - [`identifier`] - interned names for states, events and actions
//! - [`semantic`] - the validated, name-resolved state machine graph
//! - [`optimized`] - the flattened per-state transition tables handed to generators

pub mod identifier;
pub mod optimized;
pub mod semantic;
