//! State store and component subscription protocol for the trip planner UI.
//!
//! The crate keeps one JSON document as the single source of truth and
//! notifies registered bindings, in registration order, when the paths they
//! watch change. The layout follows a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (path access, bindings, slices).
//!   No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (config, document and script files).
//!
//! [`store`] owns the document and the binding list, [`component`] builds
//! render regions on top of it, and [`replay`] drives a store from a script
//! for the CLI.

pub mod component;
pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod replay;
pub mod state;
pub mod store;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
