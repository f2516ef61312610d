//! Signing and verification primitives.

use std::path::Path;

use ed25519_dalek::{Signature, Signer as _, SigningKey, VerifyingKey};
use secrecy::SecretString;

use crate::error::{LicenseError, Result};
use crate::{keys, util};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerDescriptor {
    /// SHA-256 hex of the raw 32-byte public key.
    pub key_id: String,
    /// Human-readable descriptor (e.g., "ed25519/pkcs8-pem").
    pub kind: String,
}

/// Trait boundary for all signer implementations.
///
/// The issuer only needs bytes in, signature out; an HSM-backed signer can
/// sit behind the same interface as [`Ed25519Signer`].
pub trait Signer {
    fn descriptor(&self) -> &SignerDescriptor;
    fn sign(&self, msg: &[u8]) -> Result<Vec<u8>>;
}

// ---------------------------------------------------------------------------
// In-process Ed25519 signer
// ---------------------------------------------------------------------------

pub struct Ed25519Signer {
    signing_key: SigningKey,
    descriptor: SignerDescriptor,
}

impl std::fmt::Debug for Ed25519Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ed25519Signer")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

impl Ed25519Signer {
    pub fn new(signing_key: SigningKey, kind: &str) -> Self {
        let key_id = key_id(&signing_key.verifying_key());
        Self {
            signing_key,
            descriptor: SignerDescriptor {
                key_id,
                kind: kind.to_string(),
            },
        }
    }

    /// Load a PKCS#8 PEM private key file.
    pub fn from_key_pem(key_pem_path: &Path, passphrase: Option<&SecretString>) -> Result<Self> {
        let signing_key = keys::load_private_key(key_pem_path, passphrase)?;
        Ok(Self::new(signing_key, "ed25519/pkcs8-pem"))
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }
}

impl Signer for Ed25519Signer {
    fn descriptor(&self) -> &SignerDescriptor {
        &self.descriptor
    }

    fn sign(&self, msg: &[u8]) -> Result<Vec<u8>> {
        let sig: Signature = self.signing_key.sign(msg);
        Ok(sig.to_bytes().to_vec())
    }
}

// ---------------------------------------------------------------------------
// Standalone verification
// ---------------------------------------------------------------------------

/// Stable identifier of a public key: SHA-256 hex of its raw bytes.
pub fn key_id(key: &VerifyingKey) -> String {
    util::sha256_hex(key.as_bytes())
}

/// Strict Ed25519 verification of `sig` over `msg`.
///
/// Any failure, including a signature of the wrong length, is
/// [`LicenseError::InvalidSignature`].
pub fn verify_ed25519(key: &VerifyingKey, msg: &[u8], sig: &[u8]) -> Result<()> {
    let sig = Signature::from_slice(sig).map_err(|_| LicenseError::InvalidSignature)?;
    key.verify_strict(msg, &sig)
        .map_err(|_| LicenseError::InvalidSignature)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
