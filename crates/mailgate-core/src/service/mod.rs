//! The adapter service layer.
//!
//! [`MailAdapter`] is the entry point. The submodules are its parts: the
//! worker bridge, the selection cache, response parsing and the raw command
//! table.

mod bridge;
mod mail;
#[cfg(test)]
mod mock;
pub mod parse;
mod raw;
mod selection;

pub use bridge::Bridge;
pub use mail::{MailAdapter, QueryOptions};
pub use raw::{RawCommand, RawOutput};
pub use selection::{SelectionCache, SelectionState};
