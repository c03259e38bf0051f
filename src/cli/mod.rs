//! CLI support for dot1q-discovery.
//!
//! Argument parsing shared by `dot1q-query` and `dot1q-server`, output
//! formatting and well-known column names.
//!
//! This module is only available with the `cli` feature.

pub mod args;
pub mod hints;
pub mod output;
