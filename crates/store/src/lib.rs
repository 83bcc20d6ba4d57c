//! Remote stored-script store client.
//!
//! Provides the [`ScriptStore`] trait used by reconciliation, a reqwest
//! implementation against a search cluster's `_scripts` API, and the
//! connection configuration it is built from.

pub mod api;
pub mod config;
pub mod error;
pub mod store;

pub use api::ScriptStoreApi;
pub use error::StoreError;
pub use store::ScriptStore;
