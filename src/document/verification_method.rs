//! Verification methods allow public keys to be associated with a DID.

use serde::{Deserialize, Serialize};

use crate::keys::Jwk;

/// A DID document can express verification methods, such as cryptographic public keys, which can be
/// used to authenticate or authorize interactions with the DID subject or associated parties.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VerificationMethod {
    /// Identifier for the verification method. The value must be a string that conforms to DID URL
    /// Syntax which can be a relative DID URL that is confined to the DID document. Relative URLs
    /// are assumed by default.
    pub id: String,
    /// The type of verification method. One that is registered in a DID specification registry.
    /// <https://www.w3.org/TR/did-spec-registries/>
    #[serde(rename = "type")]
    pub type_: String,
    /// Identifier for the controller of the verification method. A DID. May be empty.
    pub controller: String,
    /// The public key material of the verification method as a JWK, if that representation is
    /// used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_jwk: Option<Jwk>,
    /// The public key material encoded as a multibase string, if that representation is used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_multibase: Option<String>,
}
