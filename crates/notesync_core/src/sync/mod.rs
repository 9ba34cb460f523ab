//! Client-side note synchronization.
//!
//! # Responsibility
//! - Keep an optimistic, race-free view of one user's notes.
//! - Reconcile local writes and remote push events through one reducer.
//!
//! # See also
//! - `store::remote` for the capability consumed here.

pub mod engine;
pub mod state;
pub mod view;
