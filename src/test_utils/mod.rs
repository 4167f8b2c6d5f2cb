//! Shared fixtures for unit tests
//!
//! - [`TestTree`]: in-memory [`ComponentTree`](crate::ComponentTree)
//! - [`Recorder`]: collects `(new, old)` pairs delivered to watch callbacks
//! - runtime helpers wiring mocked collaborators into a [`WireRuntime`]
mod common;
mod tree;

pub use common::*;
pub use tree::*;
