//! Tetricus (workspace facade crate).
//!
//! Re-exports the workspace crates under one name so integration tests,
//! benches and the binary can write `tetricus::{core,engine,adapter,types}`.

pub use tetricus_adapter as adapter;
pub use tetricus_core as core;
pub use tetricus_engine as engine;
pub use tetricus_types as types;
