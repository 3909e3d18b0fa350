//! Elliptic-curve key types for the supported signature algorithms. Public keys can be
//! reconstructed from a DID document JWK or a PEM string; signing keys from a PEM string or
//! generated fresh. Signing and verification operate on the raw signing input; the curve's
//! digest (SHA-256 for both supported curves) is applied by the ECDSA implementation.

use base64ct::{Base64UrlUnpadded, Encoding};
use ecdsa::signature::{Signer, Verifier};
use ecdsa::{Signature, SigningKey, VerifyingKey};
use k256::elliptic_curve::pkcs8::{DecodePrivateKey, DecodePublicKey};
use k256::Secp256k1;
use p256::NistP256;
use rand::rngs::OsRng;

use crate::keys::{Algorithm, Jwk};
use crate::{error::Err, tracerr, Result};

/// Elliptic-curve public key on one of the supported curves.
#[derive(Clone, Debug)]
pub enum EcPublicKey {
    /// Public key on the secp256k1 curve.
    Secp256k1(VerifyingKey<Secp256k1>),
    /// Public key on the NIST P-256 curve.
    P256(VerifyingKey<NistP256>),
}

impl EcPublicKey {
    /// The signature algorithm implied by the key's curve.
    #[must_use]
    pub const fn algorithm(&self) -> Algorithm {
        match self {
            Self::Secp256k1(_) => Algorithm::Secp256k1,
            Self::P256(_) => Algorithm::P256,
        }
    }

    /// Parse a public key from an SPKI ("PUBLIC KEY") PEM string.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidKey` - The PEM does not contain a public key on a supported curve.
    pub fn from_pem(pem: &str) -> Result<Self> {
        if let Ok(pk) = k256::PublicKey::from_public_key_pem(pem) {
            return Ok(Self::Secp256k1(pk.into()));
        }
        if let Ok(pk) = p256::PublicKey::from_public_key_pem(pem) {
            return Ok(Self::P256(pk.into()));
        }
        tracerr!(Err::InvalidKey, "Public key PEM is not on a supported curve")
    }

    /// Express the public key as a JWK.
    ///
    /// # Errors
    ///
    /// An error is returned if the key could not be expressed as a JWK.
    pub fn to_jwk(&self) -> Result<Jwk> {
        let jwk = match self {
            Self::Secp256k1(vk) => k256::PublicKey::from(*vk).to_jwk_string(),
            Self::P256(vk) => p256::PublicKey::from(*vk).to_jwk_string(),
        };
        serde_json::from_str(&jwk).map_err(std::convert::Into::into)
    }

    /// Verify a signature over a message.
    ///
    /// # Arguments
    ///
    /// * `msg` - The message the signature was computed over.
    /// * `sig` - The raw `r || s` signature bytes.
    ///
    /// # Errors
    ///
    /// * `Err::FailedSignatureVerification` - The signature does not match.
    /// * An encoding error if the signature bytes are not a valid signature structure.
    pub fn verify(&self, msg: &[u8], sig: &[u8]) -> Result<()> {
        let result = match self {
            Self::Secp256k1(vk) => {
                let sig = Signature::<Secp256k1>::from_slice(sig)?;
                vk.verify(msg, &sig)
            }
            Self::P256(vk) => {
                let sig = Signature::<NistP256>::from_slice(sig)?;
                vk.verify(msg, &sig)
            }
        };
        match result {
            Ok(()) => Ok(()),
            Err(e) => {
                tracerr!(Err::FailedSignatureVerification, "Error verifying signature: {}", e)
            }
        }
    }
}

/// Reconstruct a public key from the JWK carried in a DID document verification method.
impl TryFrom<&Jwk> for EcPublicKey {
    type Error = crate::error::Error;

    fn try_from(jwk: &Jwk) -> Result<Self> {
        let algorithm = jwk.infer_algorithm()?;
        let (x, y) = jwk.coordinates()?;

        // SEC1 uncompressed point
        let mut sec1 = vec![0x04];
        sec1.extend(&x);
        sec1.extend(&y);

        match algorithm {
            Algorithm::Secp256k1 => match VerifyingKey::<Secp256k1>::from_sec1_bytes(&sec1) {
                Ok(vk) => Ok(Self::Secp256k1(vk)),
                Err(e) => tracerr!(Err::InvalidKey, "Invalid secp256k1 point: {}", e),
            },
            Algorithm::P256 => match VerifyingKey::<NistP256>::from_sec1_bytes(&sec1) {
                Ok(vk) => Ok(Self::P256(vk)),
                Err(e) => tracerr!(Err::InvalidKey, "Invalid P-256 point: {}", e),
            },
        }
    }
}

/// Elliptic-curve signing key on one of the supported curves.
#[derive(Clone)]
pub enum EcSigningKey {
    /// Signing key on the secp256k1 curve.
    Secp256k1(SigningKey<Secp256k1>),
    /// Signing key on the NIST P-256 curve.
    P256(SigningKey<NistP256>),
}

impl EcSigningKey {
    /// The signature algorithm implied by the key's curve.
    #[must_use]
    pub const fn algorithm(&self) -> Algorithm {
        match self {
            Self::Secp256k1(_) => Algorithm::Secp256k1,
            Self::P256(_) => Algorithm::P256,
        }
    }

    /// Generate a new signing key for the specified algorithm.
    #[must_use]
    pub fn generate(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::Secp256k1 => Self::Secp256k1(SigningKey::random(&mut OsRng)),
            Algorithm::P256 => Self::P256(SigningKey::random(&mut OsRng)),
        }
    }

    /// Parse a private key from a PEM string. Both SEC1 ("EC PRIVATE KEY") and PKCS#8
    /// ("PRIVATE KEY") encodings are accepted; the curve is taken from the encoded parameters.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidKey` - The PEM does not contain a private key on a supported curve.
    pub fn from_pem(pem: &str) -> Result<Self> {
        if let Ok(sk) = k256::SecretKey::from_sec1_pem(pem) {
            return Ok(Self::Secp256k1(sk.into()));
        }
        if let Ok(sk) = k256::SecretKey::from_pkcs8_pem(pem) {
            return Ok(Self::Secp256k1(sk.into()));
        }
        if let Ok(sk) = p256::SecretKey::from_sec1_pem(pem) {
            return Ok(Self::P256(sk.into()));
        }
        if let Ok(sk) = p256::SecretKey::from_pkcs8_pem(pem) {
            return Ok(Self::P256(sk.into()));
        }
        tracerr!(Err::InvalidKey, "Private key PEM is not on a supported curve")
    }

    /// Sign a message.
    ///
    /// # Arguments
    ///
    /// * `msg` - The message to sign.
    ///
    /// # Returns
    ///
    /// The raw `r || s` signature bytes.
    ///
    /// # Errors
    ///
    /// * `Err::SigningError` - The message could not be signed.
    pub fn sign(&self, msg: &[u8]) -> Result<Vec<u8>> {
        let result = match self {
            Self::Secp256k1(sk) => {
                sk.try_sign(msg).map(|sig: Signature<Secp256k1>| sig.to_bytes().to_vec())
            }
            Self::P256(sk) => {
                sk.try_sign(msg).map(|sig: Signature<NistP256>| sig.to_bytes().to_vec())
            }
        };
        match result {
            Ok(sig) => Ok(sig),
            Err(e) => tracerr!(Err::SigningError, "Failed to sign message: {}", e),
        }
    }

    /// The public key corresponding to this signing key.
    #[must_use]
    pub fn verifying_key(&self) -> EcPublicKey {
        match self {
            Self::Secp256k1(sk) => EcPublicKey::Secp256k1(*sk.verifying_key()),
            Self::P256(sk) => EcPublicKey::P256(*sk.verifying_key()),
        }
    }
}

/// Secret key material is never printed.
impl std::fmt::Debug for EcSigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EcSigningKey").field("algorithm", &self.algorithm()).finish_non_exhaustive()
    }
}

/// Decode the base64url `d` parameter of a private JWK into a signing key.
impl TryFrom<&Jwk> for EcSigningKey {
    type Error = crate::error::Error;

    fn try_from(jwk: &Jwk) -> Result<Self> {
        let algorithm = jwk.infer_algorithm()?;
        let Some(d) = &jwk.d else {
            tracerr!(Err::InvalidKey, "Missing secret key parameter");
        };
        let raw_d = match Base64UrlUnpadded::decode_vec(d) {
            Ok(raw_d) => raw_d,
            Err(e) => tracerr!(Err::InvalidKey, "Invalid secret key encoding: {}", e),
        };
        match algorithm {
            Algorithm::Secp256k1 => match SigningKey::<Secp256k1>::from_slice(&raw_d) {
                Ok(sk) => Ok(Self::Secp256k1(sk)),
                Err(e) => tracerr!(Err::InvalidKey, "Invalid secp256k1 secret key: {}", e),
            },
            Algorithm::P256 => match SigningKey::<NistP256>::from_slice(&raw_d) {
                Ok(sk) => Ok(Self::P256(sk)),
                Err(e) => tracerr!(Err::InvalidKey, "Invalid P-256 secret key: {}", e),
            },
        }
    }
}
