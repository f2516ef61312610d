//! Hashing, calendar-date helpers and input validation.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use time::{macros::format_description, Date, Duration, OffsetDateTime};

use crate::error::{LicenseError, Result};

// ---------------------------------------------------------------------------
// Hashing
// ---------------------------------------------------------------------------

pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut h = Sha256::new();
    h.update(data);
    h.finalize().into()
}

pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

/// Today's calendar date in UTC.
pub fn today_utc() -> Date {
    OffsetDateTime::now_utc().date()
}

/// Format as `YYYY-MM-DD`.
pub fn format_date(d: Date) -> String {
    d.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| d.to_string())
}

/// Parse a strict `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> std::result::Result<Date, time::error::Parse> {
    Date::parse(s, format_description!("[year]-[month]-[day]"))
}

/// Upper bound on a validity window (roughly ten thousand years).
pub const MAX_VALIDITY_DAYS: i64 = 3_652_425;

/// `start + days`, rejecting negative counts and dates past the calendar range.
pub fn add_days(start: Date, days: i64) -> Result<Date> {
    if days < 0 {
        return Err(LicenseError::InvalidParameter(format!(
            "validity_days must not be negative (got {days})"
        )));
    }
    if days > MAX_VALIDITY_DAYS {
        return Err(LicenseError::InvalidParameter(format!(
            "validity_days {days} exceeds maximum of {MAX_VALIDITY_DAYS}"
        )));
    }
    start
        .checked_add(Duration::days(days))
        .ok_or_else(|| {
            LicenseError::InvalidParameter(format!(
                "validity_days {days} overflows the calendar"
            ))
        })
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

/// Edition names: 1-64 characters, no control characters.
static VERSION_RE: std::sync::LazyLock<regex::Regex> =
    std::sync::LazyLock::new(|| regex::Regex::new(r"^[^\p{Cc}]{1,64}$").unwrap());

/// Hardware ids: 1-128 characters, no control characters.
static HARDWARE_ID_RE: std::sync::LazyLock<regex::Regex> =
    std::sync::LazyLock::new(|| regex::Regex::new(r"^[^\p{Cc}]{1,128}$").unwrap());

/// Validate a product edition name used at issuance.
pub fn validate_version(version: &str) -> Result<()> {
    if version.is_empty() {
        return Err(LicenseError::InvalidParameter(
            "version must not be empty".into(),
        ));
    }
    if !VERSION_RE.is_match(version) {
        return Err(LicenseError::InvalidParameter(format!(
            "invalid version {version:?}: 1-64 chars, no control characters"
        )));
    }
    Ok(())
}

/// Validate a hardware id used for machine binding.
pub fn validate_hardware_id(hardware_id: &str) -> Result<()> {
    if !HARDWARE_ID_RE.is_match(hardware_id) {
        return Err(LicenseError::InvalidParameter(format!(
            "invalid hardware id {hardware_id:?}: 1-128 chars, no control characters"
        )));
    }
    Ok(())
}

/// Validate that a path is not empty and does not contain null bytes.
pub fn validate_path(p: &Path, label: &str) -> Result<()> {
    let s = p.to_string_lossy();
    if s.is_empty() {
        return Err(LicenseError::InvalidParameter(format!("{label} path is empty")));
    }
    if s.contains('\0') {
        return Err(LicenseError::InvalidParameter(format!(
            "{label} path contains null byte"
        )));
    }
    Ok(())
}

/// Canonicalize a path if it exists, otherwise return it unchanged.
pub fn canonicalize_if_exists(p: &Path, label: &str) -> Result<PathBuf> {
    validate_path(p, label)?;
    if p.exists() {
        std::fs::canonicalize(p)
            .map_err(|e| LicenseError::InvalidParameter(format!("{label} path invalid: {e}")))
    } else {
        Ok(p.to_path_buf())
    }
}

// ---------------------------------------------------------------------------
// Version constants (set by build.rs)
// ---------------------------------------------------------------------------

pub const GIT_HASH: &str = env!("CCLICENSE_GIT_HASH");
pub const BUILD_TS: &str = env!("CCLICENSE_BUILD_TS");
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// One-line version string for display.
pub fn version_string() -> String {
    format!("cclicense v{VERSION} (git {GIT_HASH}, built {BUILD_TS})")
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn sha256_known_vector() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn date_format_is_zero_padded() {
        assert_eq!(format_date(date!(2024 - 03 - 05)), "2024-03-05");
    }

    #[test]
    fn date_parse_round_trip() {
        assert_eq!(parse_date("2025-12-31").unwrap(), date!(2025 - 12 - 31));
    }

    #[test]
    fn date_parse_rejects_other_shapes() {
        assert!(parse_date("31.12.2025").is_err());
        assert!(parse_date("2025-13-01").is_err());
        assert!(parse_date("2025-02-30").is_err());
        assert!(parse_date("").is_err());
    }

    #[test]
    fn add_days_crosses_month_and_leap_day() {
        assert_eq!(add_days(date!(2024 - 02 - 28), 1).unwrap(), date!(2024 - 02 - 29));
        assert_eq!(add_days(date!(2024 - 12 - 31), 1).unwrap(), date!(2025 - 01 - 01));
        assert_eq!(add_days(date!(2024 - 01 - 01), 0).unwrap(), date!(2024 - 01 - 01));
    }

    #[test]
    fn add_days_rejects_negative_and_overflow() {
        assert!(matches!(
            add_days(date!(2024 - 01 - 01), -1),
            Err(LicenseError::InvalidParameter(_))
        ));
        assert!(matches!(
            add_days(date!(2024 - 01 - 01), i64::MAX),
            Err(LicenseError::InvalidParameter(_))
        ));
        // Within the cap but past year 9999.
        assert!(matches!(
            add_days(date!(9999 - 12 - 01), 31),
            Err(LicenseError::InvalidParameter(_))
        ));
    }

    #[test]
    fn valid_versions() {
        assert!(validate_version("Pro").is_ok());
        assert!(validate_version("Enterprise Plus").is_ok());
        assert!(validate_version("v2.1_beta-3").is_ok());
        assert!(validate_version("Büro").is_ok());
        assert!(validate_version("Pro+").is_ok());
        assert!(validate_version(" Pro").is_ok());
    }

    #[test]
    fn invalid_versions() {
        assert!(validate_version("").is_err());
        assert!(validate_version("Pro\tPlus").is_err());
        assert!(validate_version("Pro\n").is_err());
        assert!(validate_version(&"P".repeat(100)).is_err());
    }

    #[test]
    fn hardware_ids() {
        assert!(validate_hardware_id("MACHINE-A").is_ok());
        assert!(validate_hardware_id(&sha256_hex(b"host")).is_ok());
        assert!(validate_hardware_id("").is_err());
        assert!(validate_hardware_id("MACHINE A").is_ok());
        assert!(validate_hardware_id("Rechner-Büro").is_ok());
        assert!(validate_hardware_id("line\nbreak").is_err());
        assert!(validate_hardware_id(&"A".repeat(200)).is_err());
    }

    #[test]
    fn version_string_non_empty() {
        assert!(version_string().contains("cclicense"));
    }
}
