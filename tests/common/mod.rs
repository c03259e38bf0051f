//! Shared test utilities for dot1q-discovery integration tests.

// Each test binary uses a different subset.
#![allow(dead_code)]
#![allow(unused_imports)]

mod agent;
mod fixtures;
mod stream;

pub use agent::*;
pub use fixtures::*;
pub use stream::drain;
