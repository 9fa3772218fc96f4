//! Two-direction SCIM 2.0 validation.
//!
//! [`payload`] checks documents a client is about to send (POST/PUT/PATCH)
//! against the [`scim_schema`] registry. [`response`] checks what a server
//! sends back, with a strict/compat severity dial that decides whether a
//! known real-world deviation fails the run or merely warns about it. The
//! two validators share the registry but carry no state between calls and
//! no state between each other.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod payload;
pub mod response;

pub use payload::ValidationError;
pub use response::{ResponseValidator, ServerValidationError, Severity};
