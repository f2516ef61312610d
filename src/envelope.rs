//! Two-stage token envelope.
//!
//! 1. **Container** (inner stage): payload bytes and signature bytes, each
//!    transport-encoded, in a JSON object `{"payload": .., "signatur": ..}`.
//! 2. **Token** (outer stage): the container JSON, transport-encoded into the
//!    opaque string handed to the license holder.
//!
//! Opening a token yields the exact bytes that were signed, so the verifier
//! never has to re-serialize a payload before checking its signature.

use serde::{Deserialize, Serialize};

use crate::error::{LicenseError, OptionExt as _, Result, ResultExt as _};
use crate::transport;

#[derive(Serialize, Deserialize)]
struct Container {
    #[serde(default)]
    payload: Option<String>,
    #[serde(default, rename = "signatur")]
    signature: Option<String>,
}

/// Signed payload bytes and their signature, as carried in a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedToken {
    pub payload: Vec<u8>,
    pub signature: Vec<u8>,
}

impl SignedToken {
    pub fn new(payload: Vec<u8>, signature: Vec<u8>) -> Self {
        Self { payload, signature }
    }

    // -- inner stage --------------------------------------------------------

    /// Container JSON bytes.
    pub fn to_container(&self) -> Result<Vec<u8>> {
        let container = Container {
            payload: Some(transport::encode(&self.payload)),
            signature: Some(transport::encode(&self.signature)),
        };
        serde_json::to_vec(&container).ctx_malformed("serialize token container")
    }

    /// Parse container JSON bytes. Missing, empty or undecodable segments are
    /// [`LicenseError::MalformedToken`], and so is any container that is not
    /// byte-for-byte what [`Self::to_container`] would produce (extra
    /// whitespace, escapes, key order, unknown fields).
    pub fn from_container(bytes: &[u8]) -> Result<Self> {
        let container: Container =
            serde_json::from_slice(bytes).ctx_malformed("parse token container")?;

        let payload_b64 = container
            .payload
            .filter(|s| !s.is_empty())
            .required_malformed("token container has no payload")?;
        let signature_b64 = container
            .signature
            .filter(|s| !s.is_empty())
            .required_malformed("token container has no signature")?;

        let payload = transport::decode(&payload_b64).ctx_malformed("decode payload segment")?;
        let signature =
            transport::decode(&signature_b64).ctx_malformed("decode signature segment")?;

        let token = Self { payload, signature };
        if token.to_container()? != bytes {
            return Err(LicenseError::MalformedToken(
                "token container is not in canonical form".into(),
            ));
        }
        Ok(token)
    }

    // -- outer stage --------------------------------------------------------

    /// The final token string.
    pub fn encode(&self) -> Result<String> {
        Ok(transport::encode(&self.to_container()?))
    }

    /// Open a token string.
    pub fn decode(token: &str) -> Result<Self> {
        if token.trim().is_empty() {
            return Err(LicenseError::MalformedToken("token is empty".into()));
        }
        let container = transport::decode(token).ctx_malformed("decode token")?;
        Self::from_container(&container)
    }
}
