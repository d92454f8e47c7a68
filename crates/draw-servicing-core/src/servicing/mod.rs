//! Storage-backed servicing sequences built on the engine.
//!
//! Each function reads what it needs through a [`crate::ports::StoragePort`],
//! runs the pure computation and writes the result back. Nothing here holds
//! state between calls.

pub mod draws;
pub mod loans;
