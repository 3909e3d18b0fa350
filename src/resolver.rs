//! DID resolution: the client trait for obtaining DID documents from a registry, the W3C
//! resolution envelope, and the policy for extracting a public key from a resolved document.

use serde::{Deserialize, Serialize};

use crate::document::DidDocument;
use crate::keys::ec::EcPublicKey;
use crate::{error::Err, tracerr, Result};

/// Metadata associated with a DID resolution response.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResolutionMetadata {
    /// The content type of the response. e.g. "application/did+ld+json".
    pub content_type: String,
    /// An error code if the resolution failed. See
    /// <https://www.w3.org/TR/did-spec-registries/#error> for a list of valid strings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Metadata associated with a DID document.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentMetadata {
    /// The time the document was created. The value of the property is a string formatted as an
    /// XML Datetime normalized to UTC 00:00:00 and without sub-second decimal precision. For
    /// example: 2020-12-20T19:17:47Z.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    /// The time the document was last updated. Follows the same formatting rules as the created
    /// property. Omitted if an update operation has never been performed on the DID document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    /// If a DID has been deactivated, DID document metadata must include this property with the
    /// boolean value true.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deactivated: Option<bool>,
}

/// Return type from a DID document resolution endpoint.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Resolution {
    /// The context of the resolution. e.g. "https://w3id.org/did-resolution/v1".
    #[serde(rename = "@context")]
    pub context: String,
    /// The DID document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub did_document: Option<DidDocument>,
    /// Metadata associated with the document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub did_document_metadata: Option<DocumentMetadata>,
    /// Metadata associated with the response to the resolution request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub did_resolution_metadata: Option<ResolutionMetadata>,
}

/// A `DidClient` is responsible for resolving a DID to a DID document, typically over a network.
/// Timeouts and retries are the client's concern.
#[allow(async_fn_in_trait)]
pub trait DidClient {
    /// Resolve a DID to a DID document.
    ///
    /// # Arguments
    ///
    /// * `did` - The DID to resolve.
    ///
    /// # Returns
    ///
    /// The DID document, or `None` if the registry holds no document for the DID. Absence is a
    /// legitimate outcome, distinct from a resolution failure.
    ///
    /// # Errors
    ///
    /// Any failure other than absence: transport errors, registry errors, malformed responses.
    async fn resolve(&self, did: &str) -> Result<Option<DidDocument>>;
}

/// Resolves a DID to the single elliptic-curve public key of a required verification method type.
///
/// Stateless apart from the registry client it delegates document retrieval to; performs no
/// caching of its own.
pub struct DidPublicKeyResolver<C>
where
    C: DidClient,
{
    client: C,
}

impl<C> DidPublicKeyResolver<C>
where
    C: DidClient,
{
    /// Create a resolver backed by the specified registry client.
    pub const fn new(client: C) -> Self {
        Self { client }
    }

    /// Resolve a DID to a public key.
    ///
    /// The resolved document's verification methods are filtered by `key_type` and exactly one
    /// match is required. Ambiguity is always an error, never resolved by taking the first match.
    ///
    /// # Arguments
    ///
    /// * `did_url` - The DID to resolve.
    /// * `key_type` - The required verification method type, e.g.
    ///   "EcdsaSecp256k1VerificationKey2019".
    ///
    /// # Returns
    ///
    /// The public key, or `None` if the registry holds no document for the DID.
    ///
    /// # Errors
    ///
    /// * `Err::KeyNotFound` - The document contains no verification method of the required type.
    /// * `Err::InvalidInput` - The document contains more than one method of the required type.
    /// * `Err::InvalidKey` - The single matching method does not hold a valid EC public key.
    /// * Any error raised by the registry client, passed through unchanged.
    pub async fn resolve_public_key(
        &self,
        did_url: &str,
        key_type: &str,
    ) -> Result<Option<EcPublicKey>> {
        let Some(document) = self.client.resolve(did_url).await? else {
            return Ok(None);
        };

        let matches = document.keys_of_type(key_type);
        if matches.is_empty() {
            tracerr!(Err::KeyNotFound, "DID does not contain a Public Key!");
        }
        if matches.len() > 1 {
            tracerr!(
                Err::InvalidInput,
                "DID contains more than one \"{}\" public keys!",
                key_type
            );
        }

        let Some(jwk) = &matches[0].public_key_jwk else {
            tracerr!(
                Err::InvalidKey,
                "Public Key was not a valid EC Key! Verification method has no JWK"
            );
        };
        match EcPublicKey::try_from(jwk) {
            Ok(key) => Ok(Some(key)),
            Err(e) => tracerr!(Err::InvalidKey, "Public Key was not a valid EC Key! {}", e),
        }
    }
}
