//! Prelude module for convenient imports.
//!
//! ```rust,no_run
//! use dot1q_discovery::prelude::*;
//! ```
//!
//! This imports the client and discovery types, the views they produce,
//! [`Error`]/[`Result`] and the [`oid!`] macro.

pub use crate::cache::ResultCache;
pub use crate::client::Client;
pub use crate::discovery::Discovery;
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::oid::Oid;
pub use crate::table::OidTable;
pub use crate::topology::{TrunkInterface, VlanRecord, VlanView};
pub use crate::value::Value;
pub use crate::varbind::VarBind;

#[doc(no_inline)]
pub use crate::oid;
