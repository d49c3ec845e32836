//! Request signing for thumbnail URLs.
//!
//! Every thumbnail request must carry a `Signature` header proving that a
//! holder of the shared secret authorized that exact path:
//!
//! ```text
//! signature = base64(HMAC-SHA256(secret_key, escaped_request_path))
//! ```
//!
//! The path is signed exactly as it appears on the wire, percent-escapes
//! included, e.g. `/thumb/http%3A%2F%2Fexample.com%2Fa.jpg`. Signatures do
//! not expire; rotate the secret to revoke them.
//!
//! Verification compares the encoded signatures in constant time so the
//! response time does not reveal how many leading bytes of a forged
//! signature were correct.
//!
//! # Example
//!
//! ```rust
//! use thumb_streamer::auth::RequestSigner;
//!
//! let signer = RequestSigner::new("my-secret-key");
//! let path = "/thumb/photos/cat.jpg";
//!
//! let signature = signer.sign(path).unwrap();
//! assert!(signer.verify(&signature, path).is_ok());
//! ```

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

/// HMAC-SHA256 type alias
type HmacSha256 = Hmac<Sha256>;

/// Request header carrying the signature.
pub const SIGNATURE_HEADER: &str = "Signature";

/// Authentication error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No signature was supplied with the request
    MissingSignature,

    /// Supplied signature does not match the path
    SignatureMismatch,

    /// The MAC could not be computed
    ComputeFailure(String),
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingSignature => write!(f, "Missing signature header"),
            AuthError::SignatureMismatch => write!(f, "Signature mismatch"),
            AuthError::ComputeFailure(reason) => {
                write!(f, "Failed to compute signature: {}", reason)
            }
        }
    }
}

impl std::error::Error for AuthError {}

/// Signs and verifies request paths with a shared secret.
#[derive(Clone)]
pub struct RequestSigner {
    /// Secret key for HMAC computation
    secret_key: Vec<u8>,
}

impl RequestSigner {
    /// Create a signer with the given secret key.
    ///
    /// Any key length is accepted; use at least 32 random bytes.
    pub fn new(secret_key: impl AsRef<[u8]>) -> Self {
        Self {
            secret_key: secret_key.as_ref().to_vec(),
        }
    }

    /// Compute the base64-encoded signature for an escaped request path.
    pub fn sign(&self, path: &str) -> Result<String, AuthError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret_key)
            .map_err(|e| AuthError::ComputeFailure(e.to_string()))?;
        mac.update(path.as_bytes());

        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }

    /// Verify `signature` against an escaped request path.
    ///
    /// Either the signature matches or the request is rejected; there is no
    /// partial result.
    pub fn verify(&self, signature: &str, path: &str) -> Result<(), AuthError> {
        let expected = self.sign(path)?;

        if signature.as_bytes().ct_eq(expected.as_bytes()).into() {
            Ok(())
        } else {
            Err(AuthError::SignatureMismatch)
        }
    }
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("secret_key", &"<redacted>")
            .finish()
    }
}
