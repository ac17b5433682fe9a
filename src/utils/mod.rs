//! Shared utilities: error types and command bit packing

pub mod error;
pub mod functions;
