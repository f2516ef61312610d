//! Token issuance (vendor side).
//!
//! ## Lifecycle
//! 1. **Vendor** generates a key pair once: [`crate::keys::generate_keypair`]
//! 2. **Vendor** issues a token per customer: [`issue`]
//! 3. **Application** verifies it offline with the public key:
//!    [`crate::validator::validate`]

use ed25519_dalek::SigningKey;
use time::Date;
use tracing::info;

use crate::envelope::SignedToken;
use crate::error::Result;
use crate::payload::{self, LicensePayload};
use crate::signing::{Ed25519Signer, Signer};
use crate::util;

/// Issue a token dated today (UTC).
///
/// `validity_days = 0` yields a token valid through the end of the issuance
/// day. Negative counts are rejected before any signing happens.
pub fn issue(
    private_key: &SigningKey,
    version: &str,
    validity_days: i64,
    hardware_id: Option<&str>,
) -> Result<String> {
    let signer = Ed25519Signer::new(private_key.clone(), "ed25519/in-memory");
    issue_on(&signer, util::today_utc(), version, validity_days, hardware_id)
}

/// Issue a token with an explicit issuance date through any [`Signer`].
pub fn issue_on(
    signer: &dyn Signer,
    today: Date,
    version: &str,
    validity_days: i64,
    hardware_id: Option<&str>,
) -> Result<String> {
    let payload = build_payload(today, version, validity_days, hardware_id)?;
    let payload_bytes = payload::encode(&payload)?;
    let signature = signer.sign(&payload_bytes)?;
    let token = SignedToken::new(payload_bytes, signature).encode()?;

    info!(
        version = %payload.version,
        issued_at = %payload.issued_at,
        expires_at = %payload.expires_at,
        hardware_bound = payload.hardware_id.is_some(),
        key_id = %signer.descriptor().key_id,
        "license token issued"
    );
    Ok(token)
}

/// Validate issuance parameters and assemble the payload.
pub fn build_payload(
    today: Date,
    version: &str,
    validity_days: i64,
    hardware_id: Option<&str>,
) -> Result<LicensePayload> {
    util::validate_version(version)?;
    if let Some(id) = hardware_id {
        util::validate_hardware_id(id)?;
    }
    let expires_at = util::add_days(today, validity_days)?;

    Ok(LicensePayload {
        version: version.to_string(),
        issued_at: today,
        expires_at,
        hardware_id: hardware_id.map(str::to_string),
    })
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
