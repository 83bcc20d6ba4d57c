//! Stored-script model, declaration codec and composite identifiers.
//!
//! Pure logic with no I/O: converts a declared stored script into the
//! canonical model and back, encodes the `_scripts` wire format, compares
//! JSON semantically for drift detection, and composes/parses the ids used
//! to address a script within a cluster.

pub mod declared;
pub mod diff;
pub mod error;
pub mod id;
pub mod json;
pub mod script;
pub mod wire;
