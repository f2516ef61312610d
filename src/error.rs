//! Structured error types for the license core.
//!
//! Every public library function returns [`Result<T>`] which carries a
//! [`LicenseError`]. Validation rejections (a token that is not a valid
//! license) and system failures (unreadable key files, broken key material)
//! share the enum but are told apart with [`LicenseError::is_rejection`].
//! The CLI converts both into process exit codes via [`ErrorCode`].

use thiserror::Error;

use crate::payload::LicensePayload;

// ---------------------------------------------------------------------------
// Primary error enum
// ---------------------------------------------------------------------------

/// Error type for key handling, issuance and validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LicenseError {
    #[error("key encoding: {0}")]
    KeyEncoding(String),

    #[error("key decoding: {0}")]
    KeyDecoding(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// Signature did not verify against the public key. Tampered, forged or
    /// signed by a different key.
    #[error("license signature invalid")]
    InvalidSignature,

    #[error("payload format: {0}")]
    PayloadFormat(String),

    #[error("payload type: {0}")]
    PayloadType(String),

    #[error("license version mismatch: expected '{expected}', found '{found}'")]
    VersionMismatch { expected: String, found: String },

    /// The only rejection that still hands the verified payload back, so
    /// callers can show when the license ran out.
    #[error("license expired on {}", .payload.expires_at)]
    Expired { payload: LicensePayload },

    #[error(
        "hardware id mismatch: expected '{expected}', license is bound to {}",
        describe_binding(.found)
    )]
    HardwareMismatch {
        expected: String,
        found: Option<String>,
    },

    #[error("io: {0}")]
    Io(String),

    #[error("config: {0}")]
    Config(String),
}

fn describe_binding(found: &Option<String>) -> String {
    match found {
        Some(id) => format!("'{id}'"),
        None => "no machine".to_string(),
    }
}

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, LicenseError>;

impl LicenseError {
    /// `true` for outcomes meaning "this token is not a valid license",
    /// `false` for failures of the surrounding system (keys, files, config,
    /// caller parameters).
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::MalformedToken(_)
                | Self::InvalidSignature
                | Self::PayloadFormat(_)
                | Self::PayloadType(_)
                | Self::VersionMismatch { .. }
                | Self::Expired { .. }
                | Self::HardwareMismatch { .. }
        )
    }

    /// The verified payload of an expired license, for diagnostic display.
    pub fn expired_payload(&self) -> Option<&LicensePayload> {
        match self {
            Self::Expired { payload } => Some(payload),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Exit codes
// ---------------------------------------------------------------------------

/// Process exit codes used by the `cclicense` binary.
///
/// `1` is left to generic failures reported through `anyhow`.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Ok = 0,
    MalformedToken = 10,
    InvalidSignature = 11,
    PayloadFormat = 12,
    PayloadType = 13,
    VersionMismatch = 14,
    Expired = 15,
    HardwareMismatch = 16,
    KeyEncoding = 20,
    KeyDecoding = 21,
    InvalidParameter = 22,
    IoError = 30,
    ConfigError = 31,
}

impl From<&LicenseError> for ErrorCode {
    fn from(e: &LicenseError) -> Self {
        match e {
            LicenseError::KeyEncoding(_) => Self::KeyEncoding,
            LicenseError::KeyDecoding(_) => Self::KeyDecoding,
            LicenseError::InvalidParameter(_) => Self::InvalidParameter,
            LicenseError::MalformedToken(_) => Self::MalformedToken,
            LicenseError::InvalidSignature => Self::InvalidSignature,
            LicenseError::PayloadFormat(_) => Self::PayloadFormat,
            LicenseError::PayloadType(_) => Self::PayloadType,
            LicenseError::VersionMismatch { .. } => Self::VersionMismatch,
            LicenseError::Expired { .. } => Self::Expired,
            LicenseError::HardwareMismatch { .. } => Self::HardwareMismatch,
            LicenseError::Io(_) => Self::IoError,
            LicenseError::Config(_) => Self::ConfigError,
        }
    }
}

// ---------------------------------------------------------------------------
// Context extension trait
// ---------------------------------------------------------------------------

/// Extension trait that tags any `Result<T, E>` with a [`LicenseError`] kind.
///
/// ```ignore
/// SigningKey::from_pkcs8_pem(pem).ctx_key_decoding("parse private key")?;
/// ```
pub trait ResultExt<T> {
    fn ctx_key_encoding(self, msg: &str) -> Result<T>;
    fn ctx_key_decoding(self, msg: &str) -> Result<T>;
    fn ctx_malformed(self, msg: &str) -> Result<T>;
    fn ctx_payload_format(self, msg: &str) -> Result<T>;
    fn ctx_payload_type(self, msg: &str) -> Result<T>;
    fn ctx_io(self, msg: &str) -> Result<T>;
    fn ctx_config(self, msg: &str) -> Result<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for std::result::Result<T, E> {
    fn ctx_key_encoding(self, msg: &str) -> Result<T> {
        self.map_err(|e| LicenseError::KeyEncoding(format!("{msg}: {e}")))
    }
    fn ctx_key_decoding(self, msg: &str) -> Result<T> {
        self.map_err(|e| LicenseError::KeyDecoding(format!("{msg}: {e}")))
    }
    fn ctx_malformed(self, msg: &str) -> Result<T> {
        self.map_err(|e| LicenseError::MalformedToken(format!("{msg}: {e}")))
    }
    fn ctx_payload_format(self, msg: &str) -> Result<T> {
        self.map_err(|e| LicenseError::PayloadFormat(format!("{msg}: {e}")))
    }
    fn ctx_payload_type(self, msg: &str) -> Result<T> {
        self.map_err(|e| LicenseError::PayloadType(format!("{msg}: {e}")))
    }
    fn ctx_io(self, msg: &str) -> Result<T> {
        self.map_err(|e| LicenseError::Io(format!("{msg}: {e}")))
    }
    fn ctx_config(self, msg: &str) -> Result<T> {
        self.map_err(|e| LicenseError::Config(format!("{msg}: {e}")))
    }
}

/// Same as [`ResultExt`] but for `Option<T>` (converts `None` into an error).
pub trait OptionExt<T> {
    fn required_malformed(self, msg: &str) -> Result<T>;
    fn required_payload(self, msg: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn required_malformed(self, msg: &str) -> Result<T> {
        self.ok_or_else(|| LicenseError::MalformedToken(msg.to_string()))
    }
    fn required_payload(self, msg: &str) -> Result<T> {
        self.ok_or_else(|| LicenseError::PayloadFormat(msg.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn sample_payload() -> LicensePayload {
        LicensePayload {
            version: "Pro".into(),
            issued_at: date!(2024 - 01 - 01),
            expires_at: date!(2024 - 12 - 31),
            hardware_id: None,
        }
    }

    #[test]
    fn rejections_are_told_apart_from_failures() {
        assert!(LicenseError::InvalidSignature.is_rejection());
        assert!(LicenseError::MalformedToken("x".into()).is_rejection());
        assert!(LicenseError::Expired { payload: sample_payload() }.is_rejection());
        assert!(!LicenseError::KeyDecoding("x".into()).is_rejection());
        assert!(!LicenseError::Io("x".into()).is_rejection());
        assert!(!LicenseError::InvalidParameter("x".into()).is_rejection());
    }

    #[test]
    fn only_expired_carries_payload() {
        let err = LicenseError::Expired { payload: sample_payload() };
        assert_eq!(err.expired_payload().map(|p| p.version.as_str()), Some("Pro"));
        assert!(LicenseError::InvalidSignature.expired_payload().is_none());
    }

    #[test]
    fn messages_name_the_failed_rule() {
        let err = LicenseError::Expired { payload: sample_payload() };
        assert_eq!(err.to_string(), "license expired on 2024-12-31");

        let err = LicenseError::HardwareMismatch {
            expected: "MACHINE-B".into(),
            found: None,
        };
        assert!(err.to_string().contains("no machine"));

        let err = LicenseError::VersionMismatch {
            expected: "Basic".into(),
            found: "Pro".into(),
        };
        assert!(err.to_string().contains("expected 'Basic'"));
    }

    #[test]
    fn exit_codes_are_distinct_per_rule() {
        assert_eq!(ErrorCode::from(&LicenseError::InvalidSignature) as i32, 11);
        assert_eq!(
            ErrorCode::from(&LicenseError::Expired { payload: sample_payload() }),
            ErrorCode::Expired
        );
        assert_eq!(
            ErrorCode::from(&LicenseError::Io("x".into())),
            ErrorCode::IoError
        );
    }

    #[test]
    fn option_ext_maps_none() {
        let none: Option<u8> = None;
        assert!(matches!(
            none.required_payload("missing field"),
            Err(LicenseError::PayloadFormat(_))
        ));
        assert!(matches!(
            None::<u8>.required_malformed("missing segment"),
            Err(LicenseError::MalformedToken(_))
        ));
    }
}
