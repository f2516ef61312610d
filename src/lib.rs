//! CipherCore license core.
//!
//! This crate provides:
//! - Ed25519 key pairs with PKCS#8 / SubjectPublicKeyInfo PEM encodings
//!   (optionally passphrase-protected private keys)
//! - A canonical, byte-stable encoding of the license payload
//! - Issuance of self-contained, signed license tokens
//! - Fail-closed offline validation (signature, version, expiry, hardware
//!   binding)
//!
//! The CLI wrapper lives in `src/main.rs`.

#![deny(unsafe_code)]

pub mod config;
pub mod error;

pub mod envelope;
pub mod hardware;
pub mod issuer;
pub mod keys;
pub mod payload;
pub mod signing;
pub mod transport;
pub mod util;
pub mod validator;

pub use error::{LicenseError, Result};
pub use issuer::issue;
pub use keys::{export_private, export_public, generate_keypair, import_public, KeyPair};
pub use payload::LicensePayload;
pub use validator::{validate, LicenseStatus};
