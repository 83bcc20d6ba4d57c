//! Reconciliation of declared stored scripts against a live cluster.
//!
//! [`StoredScriptController`] exposes the put / read / delete lifecycle
//! plus `apply` and `plan`, all over the [`ScriptStore`](scriptkeeper_store::ScriptStore)
//! seam so tests can run against an in-memory store.

pub mod controller;
pub mod error;
pub mod plan;

pub use controller::{
    AppliedScript, DeleteOutcome, ObservedScript, ReadOutcome, StoredScriptController,
};
pub use error::{ReconcileError, ReconcileResult};
pub use plan::Plan;
