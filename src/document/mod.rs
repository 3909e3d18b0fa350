//! DID Document and its component data structures.

use serde::{Deserialize, Serialize};

use crate::document::service::Service;
use crate::document::verification_method::VerificationMethod;

pub mod service;
pub mod verification_method;

/// A DID is associated with a DID document that can be serialized into a representation of the DID.
/// <https://www.w3.org/TR/did-core/>
///
/// A document is immutable once resolved: the resolver only reads from it. Unknown document
/// properties are ignored on deserialization.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DidDocument {
    /// The DID document's unique identifier. It is a URI scheme conformant with RFC3986. The syntax
    /// conforms to that of the DID method implementation: "did:{method}:{uri}", where the URI
    /// portion can be used by a resolver of the DID method to retrieve the DID document.
    pub id: String,
    /// A set of parameters that can be used together with a process to independently verify a
    /// proof. For example, a cryptographic public key can be used as a verification method with
    /// respect to a digital signature; in such usage, it verifies that the signer possessed the
    /// associated cryptographic private key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_method: Option<Vec<VerificationMethod>>,
    /// Services are used to express ways of communicating with the DID subject or associated
    /// entities. Irrelevant to key resolution and carried through unchanged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<Vec<Service>>,
}

/// Utility methods for looking up DID document components.
impl DidDocument {
    /// All verification methods whose type matches the specified verification method type.
    /// Duplicates are returned as-is: how many matches are acceptable is the caller's policy.
    #[must_use]
    pub fn keys_of_type(&self, type_: &str) -> Vec<&VerificationMethod> {
        match &self.verification_method {
            Some(vms) => vms.iter().filter(|vm| vm.type_ == type_).collect(),
            None => Vec::new(),
        }
    }
}
