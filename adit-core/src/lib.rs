//! Shared primitives for the Adit reaction-network toolkit.
//!
//! `adit-core` provides the foundation the other Adit crates build on:
//!
//! - **Error types** — [`AditError`] and [`Result`] for structured error handling
//! - **Hashing** — SHA-256 content addressing for compound and reaction identity
//! - **Traits** — Cross-crate contracts like [`ContentAddressable`] and [`Summarizable`]

pub mod error;
pub mod hash;
pub mod traits;

pub use error::{AditError, Result};
pub use traits::*;
