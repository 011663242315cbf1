//! Deterministic, pure logic shared by the store.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! JSON values and return deterministic outputs suitable for tests.

pub mod binding;
pub mod path;
pub mod types;
