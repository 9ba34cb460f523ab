//! Note domain model.
//!
//! # Responsibility
//! - Define canonical data structures used by the sync engine and the
//!   summary pipeline.
//!
//! # Invariants
//! - Every note is identified by a store-assigned, immutable `NoteId`.
//! - Input is validated before any remote call is attempted.

pub mod note;
