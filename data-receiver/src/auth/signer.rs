//! HMAC signature verification.
//!
//! The signer computes `HMAC(hash, key, message)`, encodes the raw MAC with the
//! configured encoder and compares it to the signature sent by the caller.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

use super::Authenticator;
use crate::error::ReceiverError;
use crate::services::Parameters;

type HmacSha1 = Hmac<Sha1>;
type HmacSha256 = Hmac<Sha256>;

/// Parameter holding the shared secret.
pub const KEY_PARAM: &str = "Key";
/// Parameter naming the hash function.
pub const HASHER_PARAM: &str = "Hasher";
/// Parameter naming the signature encoding.
pub const ENCODER_PARAM: &str = "Encrypter";

/// Hash function underlying the HMAC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha1,
    Sha256,
}

impl HashAlgorithm {
    fn mac(self, key: &[u8], message: &[u8]) -> Result<Vec<u8>, ReceiverError> {
        let invalid_key = |_| ReceiverError::Config("invalid HMAC key".to_string());
        Ok(match self {
            HashAlgorithm::Sha1 => {
                let mut mac = HmacSha1::new_from_slice(key).map_err(invalid_key)?;
                mac.update(message);
                mac.finalize().into_bytes().to_vec()
            }
            HashAlgorithm::Sha256 => {
                let mut mac = HmacSha256::new_from_slice(key).map_err(invalid_key)?;
                mac.update(message);
                mac.finalize().into_bytes().to_vec()
            }
        })
    }
}

impl FromStr for HashAlgorithm {
    type Err = ReceiverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sha1" => Ok(HashAlgorithm::Sha1),
            "sha256" => Ok(HashAlgorithm::Sha256),
            other => Err(ReceiverError::Config(format!(
                "unsupported hash function {other:?}"
            ))),
        }
    }
}

/// Text encoding applied to the raw MAC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureEncoding {
    Hex,
    Base64Url,
    Base64UrlNoPad,
}

impl SignatureEncoding {
    pub fn encode(self, bytes: &[u8]) -> String {
        match self {
            SignatureEncoding::Hex => hex::encode(bytes),
            SignatureEncoding::Base64Url => URL_SAFE.encode(bytes),
            SignatureEncoding::Base64UrlNoPad => URL_SAFE_NO_PAD.encode(bytes),
        }
    }
}

impl FromStr for SignatureEncoding {
    type Err = ReceiverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hex" => Ok(SignatureEncoding::Hex),
            "base64.URL" => Ok(SignatureEncoding::Base64Url),
            "base64.RawURL" => Ok(SignatureEncoding::Base64UrlNoPad),
            other => Err(ReceiverError::Config(format!(
                "unsupported signature encoding {other:?}"
            ))),
        }
    }
}

/// HMAC authenticator holding the secret key, hash function and encoding.
#[derive(Clone)]
pub struct Signer {
    key: Vec<u8>,
    hash: HashAlgorithm,
    encoding: SignatureEncoding,
}

// Keep the key out of logs.
impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("hash", &self.hash)
            .field("encoding", &self.encoding)
            .finish_non_exhaustive()
    }
}

impl Signer {
    pub fn new(key: impl Into<Vec<u8>>, hash: HashAlgorithm, encoding: SignatureEncoding) -> Self {
        Self {
            key: key.into(),
            hash,
            encoding,
        }
    }

    /// Build a signer from `Key`, `Hasher` and `Encrypter` parameters.
    ///
    /// The key is not checked for emptiness.
    pub fn from_params(params: &Parameters) -> Result<Self, ReceiverError> {
        let key = required(params, KEY_PARAM)?;
        let hash: HashAlgorithm = required(params, HASHER_PARAM)?.parse()?;
        let encoding: SignatureEncoding = required(params, ENCODER_PARAM)?.parse()?;

        Ok(Self::new(key.as_bytes(), hash, encoding))
    }

    /// Encoded HMAC of `message`.
    pub fn sign(&self, message: &[u8]) -> Result<String, ReceiverError> {
        let mac = self.hash.mac(&self.key, message)?;
        Ok(self.encoding.encode(&mac))
    }
}

impl Authenticator for Signer {
    fn authenticate(&self, message: &[u8], signature: &str) -> Result<(), ReceiverError> {
        let expected = self.sign(message)?;

        if constant_time_compare(&expected, signature) {
            return Ok(());
        }

        warn!(
            expected_length = expected.len(),
            actual_length = signature.len(),
            "signature_mismatch"
        );
        debug!(received = %signature, expected = %expected, "signature_mismatch_detail");

        Err(ReceiverError::Authentication {
            received: signature.to_string(),
            expected,
        })
    }
}

fn required<'a>(params: &'a Parameters, name: &str) -> Result<&'a str, ReceiverError> {
    params
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| ReceiverError::Config(format!("{name} not received for authenticator")))
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(key: &str, hasher: &str, encoder: &str) -> Parameters {
        Parameters::from([
            (KEY_PARAM.to_string(), key.to_string()),
            (HASHER_PARAM.to_string(), hasher.to_string()),
            (ENCODER_PARAM.to_string(), encoder.to_string()),
        ])
    }

    #[test]
    fn test_sha1_base64_raw_url() {
        let signer = Signer::from_params(&params("magickey", "sha1", "base64.RawURL")).unwrap();
        assert!(signer
            .authenticate(b"Example message", "eZIp7BDQLn3PuZrDPWSlW3x6dgo")
            .is_ok());
    }

    #[test]
    fn test_sha1_base64_url_keeps_padding() {
        let signer = Signer::from_params(&params("magickey", "sha1", "base64.URL")).unwrap();
        assert!(signer
            .authenticate(b"Example message", "eZIp7BDQLn3PuZrDPWSlW3x6dgo=")
            .is_ok());
        assert!(signer
            .authenticate(b"Example message", "eZIp7BDQLn3PuZrDPWSlW3x6dgo")
            .is_err());
    }

    #[test]
    fn test_sha256_base64_url() {
        let signer = Signer::from_params(&params("magicKey", "sha256", "base64.URL")).unwrap();
        assert_eq!(
            signer.sign(b"test message").unwrap(),
            "GXjQXzGexUuSH444qEyMI-b9Lif_Uq39gElhs_7PMVY="
        );
    }

    #[test]
    fn test_sha256_hex() {
        let signer = Signer::new("magickey", HashAlgorithm::Sha256, SignatureEncoding::Hex);
        assert!(signer
            .authenticate(
                b"Example message",
                "4fbe2d2ce7ca9ad58757aeb4b64680ce834f0965de016632f250f93d488476a8"
            )
            .is_ok());
    }

    #[test]
    fn test_known_vectors_for_every_pair() {
        let cases = [
            ("sha1", "hex", "799229ec10d02e7dcfb99ac33d64a55b7c7a760a"),
            ("sha1", "base64.URL", "eZIp7BDQLn3PuZrDPWSlW3x6dgo="),
            ("sha1", "base64.RawURL", "eZIp7BDQLn3PuZrDPWSlW3x6dgo"),
            ("sha256", "hex", "4fbe2d2ce7ca9ad58757aeb4b64680ce834f0965de016632f250f93d488476a8"),
            ("sha256", "base64.URL", "T74tLOfKmtWHV660tkaAzoNPCWXeAWYy8lD5PUiEdqg="),
            ("sha256", "base64.RawURL", "T74tLOfKmtWHV660tkaAzoNPCWXeAWYy8lD5PUiEdqg"),
        ];

        for (hasher, encoder, signature) in cases {
            let signer = Signer::from_params(&params("magickey", hasher, encoder)).unwrap();
            assert!(
                signer.authenticate(b"Example message", signature).is_ok(),
                "{hasher}/{encoder} should accept its own signature"
            );
        }
    }

    #[test]
    fn test_hex_compare_is_case_sensitive() {
        let signer = Signer::new("magickey", HashAlgorithm::Sha256, SignatureEncoding::Hex);
        assert!(signer
            .authenticate(
                b"Example message",
                "4FBE2D2CE7CA9AD58757AEB4B64680CE834F0965DE016632F250F93D488476A8"
            )
            .is_err());
    }

    #[test]
    fn test_wrong_signature_reports_both_values() {
        let signer = Signer::from_params(&params("magickey", "sha256", "base64.URL")).unwrap();

        match signer.authenticate(b"Example message", "Wrong signature") {
            Err(ReceiverError::Authentication { received, expected }) => {
                assert_eq!(received, "Wrong signature");
                assert_eq!(expected, "T74tLOfKmtWHV660tkaAzoNPCWXeAWYy8lD5PUiEdqg=");
            }
            other => panic!("Expected authentication error, got {:?}", other),
        }
    }

    #[test]
    fn test_single_bit_flip_rejected() {
        let signer = Signer::new("k", HashAlgorithm::Sha256, SignatureEncoding::Base64Url);
        let message = b"payload";
        let good = signer.sign(message).unwrap();

        for i in 0..good.len() {
            for bit in 0..8 {
                let mut bytes = good.clone().into_bytes();
                bytes[i] ^= 1 << bit;
                let Ok(mutated) = String::from_utf8(bytes) else {
                    continue;
                };
                assert!(signer.authenticate(message, &mutated).is_err());
            }
        }
    }

    #[test]
    fn test_empty_signature_rejected() {
        let signer = Signer::new("k", HashAlgorithm::Sha1, SignatureEncoding::Hex);
        assert!(signer.authenticate(b"payload", "").is_err());
    }

    #[test]
    fn test_missing_parameters() {
        let mut p = params("k", "sha1", "hex");
        p.remove(HASHER_PARAM);
        match Signer::from_params(&p) {
            Err(ReceiverError::Config(msg)) => assert!(msg.contains("Hasher")),
            other => panic!("Expected config error, got {:?}", other),
        }

        let mut p = params("k", "sha1", "hex");
        p.remove(KEY_PARAM);
        assert!(Signer::from_params(&p).is_err());

        let mut p = params("k", "sha1", "hex");
        p.remove(ENCODER_PARAM);
        assert!(Signer::from_params(&p).is_err());
    }

    #[test]
    fn test_empty_key_is_accepted() {
        assert!(Signer::from_params(&params("", "sha1", "hex")).is_ok());
    }

    #[test]
    fn test_unsupported_algorithms() {
        assert!(Signer::from_params(&params("k", "md5", "hex")).is_err());
        assert!(Signer::from_params(&params("k", "sha256", "base32")).is_err());
    }

    #[test]
    fn test_debug_hides_key() {
        let signer = Signer::new("super-secret", HashAlgorithm::Sha1, SignatureEncoding::Hex);
        assert!(!format!("{:?}", signer).contains("super-secret"));
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("abc", "abc"));
        assert!(!constant_time_compare("abc", "abd"));
        assert!(!constant_time_compare("abc", "abcd"));
        assert!(!constant_time_compare("", "a"));
        assert!(constant_time_compare("", ""));
    }
}
