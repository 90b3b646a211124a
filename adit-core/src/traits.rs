//! Core trait definitions for the Adit toolkit.
//!
//! These traits define the contracts that domain types implement across crates.

/// A type whose identity can be derived from its content via cryptographic hash.
pub trait ContentAddressable {
    /// Return the content-derived identity key as a hex string (e.g. SHA-256).
    fn content_key(&self) -> String;
}

/// A type that can produce a summary of its contents.
pub trait Summarizable {
    /// A one-line summary suitable for display.
    fn summary(&self) -> String;
}
