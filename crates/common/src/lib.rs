//! Common types, protocol definitions, and errors shared across `connect-app` crates.

pub mod error;
pub mod protocol;

pub use error::ServiceError;
