//! # DID VC
//! Types, traits and functions for anchoring trust in Decentralized Identifiers (DIDs): resolving
//! a DID to the public key it advertises, and issuing and verifying short-lived credential tokens
//! bound to that key.

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

pub(crate) mod credential;
pub(crate) mod document;
pub mod error;
pub(crate) mod keys;
pub(crate) mod resolver;
pub mod test_utils;

pub use credential::{Header, VerifiableCredential, CREDENTIAL_SUBJECT};
pub use document::{service::Service, verification_method::VerificationMethod, DidDocument};
pub use keys::{
    ec::{EcPublicKey, EcSigningKey},
    Algorithm, Jwk,
};
pub use resolver::{
    DidClient, DidPublicKeyResolver, DocumentMetadata, Resolution, ResolutionMetadata,
};

/// Result type for DID VC.
pub type Result<T, E = error::Error> = core::result::Result<T, E>;
