//! Offline token validation.
//!
//! Checks run in a fixed order and the first failure wins:
//!
//! 1. open the envelope (outer, then inner stage)
//! 2. verify the signature over the exact payload bytes
//! 3. decode the payload (only ever on verified bytes)
//! 4. version, expiry, hardware binding

use std::path::Path;

use ed25519_dalek::VerifyingKey;
use time::Date;
use tracing::{debug, warn};

use crate::envelope::SignedToken;
use crate::error::{LicenseError, Result};
use crate::payload::{self, LicensePayload};
use crate::{signing, util};

/// Validate `token` against `public_key` as of today (UTC).
///
/// "Today" is the UTC calendar date, so near midnight it can differ by one
/// day from the local date: west of UTC a license can read as expired during
/// the local evening of its last day, east of UTC it can still read as valid
/// early on the local morning after.
///
/// An empty `hardware_id_to_check` is the same as `None`: no binding check.
///
/// Rejections come back as the specific [`LicenseError`] that failed; an
/// expired license still carries its payload (see
/// [`LicenseError::expired_payload`]).
pub fn validate(
    public_key: &VerifyingKey,
    token: &str,
    expected_version: &str,
    hardware_id_to_check: Option<&str>,
) -> Result<LicensePayload> {
    validate_on(
        util::today_utc(),
        public_key,
        token,
        expected_version,
        hardware_id_to_check,
    )
}

/// [`validate`] with an explicit "today".
pub fn validate_on(
    today: Date,
    public_key: &VerifyingKey,
    token: &str,
    expected_version: &str,
    hardware_id_to_check: Option<&str>,
) -> Result<LicensePayload> {
    let outcome = run_checks(today, public_key, token, expected_version, hardware_id_to_check);
    match &outcome {
        Ok(p) => debug!(version = %p.version, expires_at = %p.expires_at, "license valid"),
        Err(e) => warn!(reason = %e, "license rejected"),
    }
    outcome
}

fn run_checks(
    today: Date,
    public_key: &VerifyingKey,
    token: &str,
    expected_version: &str,
    hardware_id_to_check: Option<&str>,
) -> Result<LicensePayload> {
    let signed = SignedToken::decode(token)?;

    signing::verify_ed25519(public_key, &signed.payload, &signed.signature)?;

    let payload = payload::decode(&signed.payload)?;

    if payload.version != expected_version {
        return Err(LicenseError::VersionMismatch {
            expected: expected_version.to_string(),
            found: payload.version,
        });
    }

    if today > payload.expires_at {
        return Err(LicenseError::Expired { payload });
    }

    if let Some(expected) = hardware_id_to_check.filter(|id| !id.is_empty()) {
        if payload.hardware_id.as_deref() != Some(expected) {
            return Err(LicenseError::HardwareMismatch {
                expected: expected.to_string(),
                found: payload.hardware_id,
            });
        }
    }

    Ok(payload)
}

// ---------------------------------------------------------------------------
// File-level check
// ---------------------------------------------------------------------------

/// Result of checking a stored license token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LicenseStatus {
    Valid(LicensePayload),
    Missing,
    Rejected(LicenseError),
}

impl LicenseStatus {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }
}

impl std::fmt::Display for LicenseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Valid(p) => write!(f, "valid ({} until {})", p.version, p.expires_at),
            Self::Missing => write!(f, "missing"),
            Self::Rejected(e) => write!(f, "invalid: {e}"),
        }
    }
}

/// Load a token from `token_path` and validate it.
///
/// Returns [`LicenseStatus`] (never errors for expected conditions like
/// "missing file" or "expired"). Only returns `Err` for I/O failures such as
/// an unreadable file.
pub fn check_license(
    token_path: &Path,
    public_key: &VerifyingKey,
    expected_version: &str,
    hardware_id_to_check: Option<&str>,
) -> Result<LicenseStatus> {
    if !token_path.exists() {
        return Ok(LicenseStatus::Missing);
    }

    let token = std::fs::read_to_string(token_path)
        .map_err(|e| LicenseError::Io(format!("read license {}: {e}", token_path.display())))?;

    Ok(
        match validate(public_key, token.trim(), expected_version, hardware_id_to_check) {
            Ok(p) => LicenseStatus::Valid(p),
            Err(e) => LicenseStatus::Rejected(e),
        },
    )
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
