//! Client for the Nylas API.
//!
//! An [`Api`] handle gives access to the change feed of an account through [`Api::deltas`] and
//! to paginated, filterable collections such as [`Api::threads`]. Every response goes through the
//! [`response`] interpreter, which turns error statuses into [`ApiError`]s.
//!
//! ```no_run
//! use nylas_api::Api;
//! use nylas_api::domain::SecretString;
//!
//! let api = Api::builder()
//!     .access_token(SecretString::from("token"))
//!     .build()?;
//! let cursor = api.latest_cursor()?;
//! for delta in api.deltas(cursor).poll() {
//!     let delta = delta?;
//!     println!("{:?} {} {:?}", delta.event, delta.record.object(), delta.record.id());
//! }
//! # Ok::<(), nylas_api::Error>(())
//! ```

mod api;
pub mod collection;
mod config;
pub mod delta;
pub mod domain;
mod errors;
pub mod materialize;
#[cfg(feature = "mocks")]
pub mod mocks;
pub mod registry;
pub mod requests;
pub mod response;

pub use api::{Api, ApiBuilder, DEFAULT_API_SERVER, user_agent};
pub use config::Config;
pub use errors::{ApiError, ApiErrorKind, Error, Result};
pub use nylas_http;
