//! Adapters - implementations of ports against real infrastructure.

pub mod http;
pub mod memory;
pub mod postgres;
pub mod providers;
