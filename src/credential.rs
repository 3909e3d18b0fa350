//! Verifiable credentials in JWS compact form: a signed set of claims with a fixed subject and a
//! bounded lifetime, issued against a DID-anchored key.

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::keys::ec::{EcPublicKey, EcSigningKey};
use crate::keys::Algorithm;
use crate::{error::Err, tracerr, Result};

/// The `sub` claim stamped on every credential issued by this library.
pub const CREDENTIAL_SUBJECT: &str = "verifiable-credential";

/// Validity window applied to newly issued credentials.
const VALIDITY_MINUTES: i64 = 10;

/// JOSE header of a credential token. Only the signing algorithm is carried; unknown header
/// parameters are ignored on parse.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Header {
    /// Signing algorithm used for the token.
    pub alg: Algorithm,
}

/// A verifiable credential: caller-supplied claims plus the reserved `iss`, `sub` and `exp`
/// claims, signed over the exact serialized form they travel in.
///
/// The signing input (the first two token segments) is retained verbatim so that a parsed
/// credential verifies against the bytes that were signed, not a re-serialization of them.
#[derive(Clone, Debug)]
pub struct VerifiableCredential {
    header: Header,
    claims: Map<String, Value>,
    signature: Vec<u8>,
    signing_input: String,
}

impl VerifiableCredential {
    /// Issue a credential over the caller's claims.
    ///
    /// The reserved claims are written after the caller's, so a caller-supplied `iss`, `sub` or
    /// `exp` is silently replaced. `exp` is set 10 minutes from now, in seconds since the Unix
    /// epoch.
    ///
    /// # Arguments
    ///
    /// * `key` - The private key to sign the credential with. Its curve determines the `alg`
    ///   header.
    /// * `claims` - The claims to include in the credential.
    /// * `issuer` - The value for the `iss` claim.
    ///
    /// # Errors
    ///
    /// * `Err::SigningError` - The signing operation itself failed.
    /// * Serialization failures for the header or claims.
    pub fn create(key: &EcSigningKey, claims: &Map<String, Value>, issuer: &str) -> Result<Self> {
        let mut all_claims = claims.clone();
        all_claims.insert("iss".to_string(), Value::from(issuer));
        all_claims.insert("sub".to_string(), Value::from(CREDENTIAL_SUBJECT));
        let expiry = Utc::now() + Duration::minutes(VALIDITY_MINUTES);
        all_claims.insert("exp".to_string(), Value::from(expiry.timestamp()));

        let header = Header { alg: key.algorithm() };
        let header_b64 = Base64UrlUnpadded::encode_string(&serde_json::to_vec(&header)?);
        let claims_b64 = Base64UrlUnpadded::encode_string(&serde_json::to_vec(&all_claims)?);
        let signing_input = format!("{header_b64}.{claims_b64}");
        let signature = key.sign(signing_input.as_bytes())?;

        Ok(Self { header, claims: all_claims, signature, signing_input })
    }

    /// Render the credential as a compact JWS token:
    /// `base64url(header).base64url(claims).base64url(signature)`, all segments unpadded.
    #[must_use]
    pub fn serialize(&self) -> String {
        format!("{}.{}", self.signing_input, Base64UrlUnpadded::encode_string(&self.signature))
    }

    /// Parse a compact JWS token into a credential.
    ///
    /// Parsing performs no signature or expiry checks. The first two token segments are retained
    /// as received so that [`Self::verify`] operates on the signed bytes.
    ///
    /// # Errors
    ///
    /// * `Err::InvalidFormat` - The token does not have exactly three dot-separated segments, a
    ///   segment is not valid unpadded base64url, or the header or claims are not the expected
    ///   JSON shape.
    pub fn parse(token: &str) -> Result<Self> {
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 3 {
            tracerr!(
                Err::InvalidFormat,
                "Token must have three parts separated by dots, found {}",
                parts.len()
            );
        }

        let header_bytes = match Base64UrlUnpadded::decode_vec(parts[0]) {
            Ok(bytes) => bytes,
            Err(e) => tracerr!(Err::InvalidFormat, "Token header is not valid base64url: {}", e),
        };
        let header: Header = match serde_json::from_slice(&header_bytes) {
            Ok(header) => header,
            Err(e) => tracerr!(Err::InvalidFormat, "Token header is not valid JSON: {}", e),
        };

        let claims_bytes = match Base64UrlUnpadded::decode_vec(parts[1]) {
            Ok(bytes) => bytes,
            Err(e) => tracerr!(Err::InvalidFormat, "Token claims are not valid base64url: {}", e),
        };
        let claims: Map<String, Value> = match serde_json::from_slice(&claims_bytes) {
            Ok(claims) => claims,
            Err(e) => tracerr!(Err::InvalidFormat, "Token claims are not a JSON object: {}", e),
        };

        let signature = match Base64UrlUnpadded::decode_vec(parts[2]) {
            Ok(bytes) => bytes,
            Err(e) => tracerr!(Err::InvalidFormat, "Token signature is not valid base64url: {}", e),
        };

        Ok(Self { header, claims, signature, signing_input: format!("{}.{}", parts[0], parts[1]) })
    }

    /// Check the credential's signature against the holder's public key.
    ///
    /// Returns false if the header algorithm does not match the key's curve, or if the signature
    /// does not verify over the signing input. Expiry is not checked here; callers decide how to
    /// treat `exp` via [`Self::expires_at`].
    #[must_use]
    pub fn verify(&self, key: &EcPublicKey) -> bool {
        if self.header.alg != key.algorithm() {
            return false;
        }
        key.verify(self.signing_input.as_bytes(), &self.signature).is_ok()
    }

    /// The signing algorithm declared in the token header.
    #[must_use]
    pub const fn algorithm(&self) -> Algorithm {
        self.header.alg
    }

    /// All claims carried by the token.
    #[must_use]
    pub const fn claims(&self) -> &Map<String, Value> {
        &self.claims
    }

    /// Look up a single claim by name.
    #[must_use]
    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }

    /// The `iss` claim, if present and a string.
    #[must_use]
    pub fn issuer(&self) -> Option<&str> {
        self.claims.get("iss").and_then(Value::as_str)
    }

    /// The `exp` claim as seconds since the Unix epoch, if present and numeric.
    #[must_use]
    pub fn expires_at(&self) -> Option<i64> {
        self.claims.get("exp").and_then(Value::as_i64)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::test_utils;

    fn sample_claims() -> Map<String, Value> {
        let mut claims = Map::new();
        claims.insert("did-url".to_string(), Value::from("someUrl"));
        claims
    }

    fn secp256k1_key() -> EcSigningKey {
        EcSigningKey::from_pem(test_utils::SECP256K1_PRIVATE_SEC1_PEM)
            .expect("should load private key")
    }

    #[test]
    fn create_stamps_reserved_claims() {
        let key = secp256k1_key();
        let before = Utc::now().timestamp();
        let vc = VerifiableCredential::create(&key, &sample_claims(), "test-connector")
            .expect("should create credential");

        assert_eq!(vc.issuer(), Some("test-connector"));
        assert_eq!(vc.claim("sub"), Some(&Value::from(CREDENTIAL_SUBJECT)));
        assert_eq!(vc.claim("did-url"), Some(&Value::from("someUrl")));
        assert_eq!(vc.algorithm(), Algorithm::Secp256k1);

        let exp = vc.expires_at().expect("should have expiry");
        assert!(exp > before);
        assert!(exp <= Utc::now().timestamp() + 11 * 60);
    }

    #[test]
    fn create_overwrites_caller_reserved_claims() {
        let key = secp256k1_key();
        let mut claims = sample_claims();
        claims.insert("iss".to_string(), Value::from("imposter"));
        claims.insert("sub".to_string(), Value::from("something-else"));
        claims.insert("exp".to_string(), Value::from(9_999_999_999_i64));

        let vc = VerifiableCredential::create(&key, &claims, "test-connector")
            .expect("should create credential");

        assert_eq!(vc.issuer(), Some("test-connector"));
        assert_eq!(vc.claim("sub"), Some(&Value::from(CREDENTIAL_SUBJECT)));
        assert!(vc.expires_at().expect("should have expiry") < 9_999_999_999);
    }

    #[test]
    fn serialize_then_parse_then_verify() {
        let key = secp256k1_key();
        let vc = VerifiableCredential::create(&key, &sample_claims(), "test-connector")
            .expect("should create credential");

        let token = vc.serialize();
        let parsed = VerifiableCredential::parse(&token).expect("should parse token");

        assert_eq!(parsed.claims(), vc.claims());
        assert_eq!(parsed.algorithm(), Algorithm::Secp256k1);
        assert_eq!(parsed.serialize(), token);
        assert!(parsed.verify(&key.verifying_key()));
    }

    #[test]
    fn header_segment_is_plain_jose() {
        let key = secp256k1_key();
        let vc = VerifiableCredential::create(&key, &sample_claims(), "test-connector")
            .expect("should create credential");

        let token = vc.serialize();
        let header_b64 = token.split('.').next().expect("should have header segment");
        let header: Value = serde_json::from_slice(
            &Base64UrlUnpadded::decode_vec(header_b64).expect("should decode header"),
        )
        .expect("should parse header");
        assert_eq!(header, json!({"alg": "ES256K"}));
    }

    #[test]
    fn verify_with_p256_key() {
        let key = EcSigningKey::from_pem(test_utils::P256_PRIVATE_SEC1_PEM)
            .expect("should load private key");
        let vc = VerifiableCredential::create(&key, &sample_claims(), "test-connector")
            .expect("should create credential");

        assert_eq!(vc.algorithm(), Algorithm::P256);
        assert!(vc.verify(&key.verifying_key()));
    }

    #[test]
    fn verify_rejects_other_key() {
        let key = secp256k1_key();
        let vc = VerifiableCredential::create(&key, &sample_claims(), "test-connector")
            .expect("should create credential");

        let other = EcSigningKey::generate(Algorithm::Secp256k1);
        assert!(!vc.verify(&other.verifying_key()));
    }

    #[test]
    fn verify_rejects_algorithm_mismatch() {
        let key = secp256k1_key();
        let vc = VerifiableCredential::create(&key, &sample_claims(), "test-connector")
            .expect("should create credential");

        let p256 = EcSigningKey::from_pem(test_utils::P256_PRIVATE_SEC1_PEM)
            .expect("should load private key");
        assert!(!vc.verify(&p256.verifying_key()));
    }

    #[test]
    fn verify_rejects_tampered_claims() {
        let key = secp256k1_key();
        let vc = VerifiableCredential::create(&key, &sample_claims(), "test-connector")
            .expect("should create credential");

        let token = vc.serialize();
        let parts: Vec<&str> = token.split('.').collect();
        let mut claims: Map<String, Value> = serde_json::from_slice(
            &Base64UrlUnpadded::decode_vec(parts[1]).expect("should decode claims"),
        )
        .expect("should parse claims");
        claims.insert("did-url".to_string(), Value::from("otherUrl"));
        let doctored = format!(
            "{}.{}.{}",
            parts[0],
            Base64UrlUnpadded::encode_string(
                &serde_json::to_vec(&claims).expect("should serialize claims")
            ),
            parts[2]
        );

        let parsed = VerifiableCredential::parse(&doctored).expect("should parse token");
        assert!(!parsed.verify(&key.verifying_key()));
    }

    #[test]
    fn parse_rejects_wrong_segment_count() {
        let err = VerifiableCredential::parse("one.two").expect_err("expected error");
        assert!(err.is(Err::InvalidFormat));

        let err = VerifiableCredential::parse("a.b.c.d").expect_err("expected error");
        assert!(err.is(Err::InvalidFormat));
        assert_eq!(err.to_string(), "Token must have three parts separated by dots, found 4");
    }

    #[test]
    fn parse_rejects_invalid_base64() {
        let err = VerifiableCredential::parse("$$$.e30.e30").expect_err("expected error");
        assert!(err.is(Err::InvalidFormat));
        assert!(err.to_string().starts_with("Token header is not valid base64url"));
    }

    #[test]
    fn parse_rejects_non_json_header() {
        let header = Base64UrlUnpadded::encode_string(b"not json");
        let err =
            VerifiableCredential::parse(&format!("{header}.e30.e30")).expect_err("expected error");
        assert!(err.is(Err::InvalidFormat));
        assert!(err.to_string().starts_with("Token header is not valid JSON"));
    }

    #[test]
    fn parse_rejects_non_object_claims() {
        let header = Base64UrlUnpadded::encode_string(b"{\"alg\":\"ES256K\"}");
        let claims = Base64UrlUnpadded::encode_string(b"[1,2,3]");
        let err = VerifiableCredential::parse(&format!("{header}.{claims}.e30"))
            .expect_err("expected error");
        assert!(err.is(Err::InvalidFormat));
        assert!(err.to_string().starts_with("Token claims are not a JSON object"));
    }
}
