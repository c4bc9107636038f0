//! Requests issued against the Nylas API.

mod account;
mod collection;
mod delta;

pub use account::*;
pub use collection::*;
pub use delta::*;
