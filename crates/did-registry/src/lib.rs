//! HTTP client for a DID registry. Resolves DIDs to DID documents through the registry's
//! resolution endpoint, tolerating both W3C resolution envelopes and bare document responses.

pub mod client;

pub use client::{HttpDidClient, RetryPolicy};
