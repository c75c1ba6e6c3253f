//! Testing utilities and mock implementations
//!
//! Lets worker loops and protocol flows be exercised without a running
//! orchestrator or network.

pub mod mocks;

pub use mocks::*;
