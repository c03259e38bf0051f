//! BER (Basic Encoding Rules) codec for SNMP.
//!
//! Only the subset of X.690 that SNMPv2c messages use: definite lengths,
//! primitive scalar types and constructed sequences/PDUs.

mod decode;
mod encode;
mod length;
pub mod tag;

pub use decode::*;
pub use encode::*;
pub use length::*;
