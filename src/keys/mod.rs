//! Cryptographic key handling: JWK structure, supported signature algorithms and elliptic-curve
//! key types for signing and verification.

use std::str::FromStr;

use base64ct::{Base64UrlUnpadded, Encoding};
use serde::{Deserialize, Serialize};

pub mod ec;

use crate::{error::Err, tracerr, Result};

/// Simplified JSON Web Key (JWK) key structure.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Jwk {
    /// Key type.
    pub kty: String,
    /// Cryptographic curve type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,
    /// X coordinate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    /// Y coordinate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
    /// Secret key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<String>,
}

impl Jwk {
    /// Attempt to match the public key parameters to one of the supported algorithm types.
    ///
    /// # Returns
    ///
    /// The algorithm type implied by the key structure.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidKey` - The key structure cannot be interpreted to a supported format.
    pub fn infer_algorithm(&self) -> Result<Algorithm> {
        match (self.kty.as_str(), self.crv.as_deref()) {
            ("EC", Some("secp256k1")) => Ok(Algorithm::Secp256k1),
            ("EC", Some("P-256")) => Ok(Algorithm::P256),
            _ => tracerr!(Err::InvalidKey, "Unknown key type and curve combination"),
        }
    }

    /// Decode the x and y coordinates into raw 32-byte values.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidKey` - A coordinate is missing, not base64url, or not 32 bytes long.
    pub fn coordinates(&self) -> Result<(Vec<u8>, Vec<u8>)> {
        let x = self.x.clone().unwrap_or_default();
        if x.is_empty() {
            tracerr!(Err::InvalidKey, "Missing x coordinate");
        }
        let raw_x = match Base64UrlUnpadded::decode_vec(&x) {
            Ok(raw_x) => raw_x,
            Err(e) => tracerr!(Err::InvalidKey, "Invalid x coordinate encoding: {}", e),
        };
        if raw_x.len() != 32 {
            tracerr!(
                Err::InvalidKey,
                "Invalid x coordinate length. Expected 32 bytes, got {}",
                raw_x.len()
            );
        }
        let y = self.y.clone().unwrap_or_default();
        if y.is_empty() {
            tracerr!(Err::InvalidKey, "Missing y coordinate");
        }
        let raw_y = match Base64UrlUnpadded::decode_vec(&y) {
            Ok(raw_y) => raw_y,
            Err(e) => tracerr!(Err::InvalidKey, "Invalid y coordinate encoding: {}", e),
        };
        if raw_y.len() != 32 {
            tracerr!(
                Err::InvalidKey,
                "Invalid y coordinate length. Expected 32 bytes, got {}",
                raw_y.len()
            );
        }
        Ok((raw_x, raw_y))
    }
}

/// Types of key signature algorithm supported by the library.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Algorithm {
    /// ECDSA using the secp256k1 curve.
    #[serde(rename = "ES256K")]
    Secp256k1,
    /// ECDSA using the NIST P-256 curve.
    #[serde(rename = "ES256")]
    P256,
}

/// Key signature type display label.
impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Algorithm::Secp256k1 => write!(f, "ES256K"),
            Algorithm::P256 => write!(f, "ES256"),
        }
    }
}

impl FromStr for Algorithm {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ES256K" => Ok(Algorithm::Secp256k1),
            "ES256" => Ok(Algorithm::P256),
            _ => tracerr!(Err::UnsupportedAlgorithm, "Unsupported signing algorithm: {}", s),
        }
    }
}

impl Algorithm {
    /// Get the verification method type for the specified key signature type.
    #[must_use]
    pub fn cryptosuite(&self) -> String {
        match self {
            Algorithm::Secp256k1 => "EcdsaSecp256k1VerificationKey2019".to_string(),
            Algorithm::P256 => "EcdsaSecp256r1VerificationKey2019".to_string(),
        }
    }

    /// The JWK curve name for the algorithm.
    #[must_use]
    pub const fn curve(&self) -> &'static str {
        match self {
            Algorithm::Secp256k1 => "secp256k1",
            Algorithm::P256 => "P-256",
        }
    }
}
