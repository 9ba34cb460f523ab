//! Remote store abstraction and in-process implementation.
//!
//! # Responsibility
//! - Define the durable-store capability consumed by the sync engine.
//! - Ship an in-memory implementation for tests and local wiring.
//!
//! # Invariants
//! - Store APIs return semantic errors (`NotFound`) in addition to transport
//!   failures.

pub mod memory;
pub mod remote;
