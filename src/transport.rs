//! URL-safe base64 used to embed binary signatures and JSON documents in a
//! single textual token.
//!
//! Output is padded and decoding requires exactly that form: canonical
//! padding, canonical trailing bits, no whitespace. Every accepted string maps
//! to exactly one byte sequence and every byte sequence to exactly one string.

use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};

const URL_SAFE_PAD: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(true)
        .with_decode_padding_mode(DecodePaddingMode::RequireCanonical),
);

pub fn encode(data: &[u8]) -> String {
    URL_SAFE_PAD.encode(data)
}

pub fn decode(s: &str) -> Result<Vec<u8>, base64::DecodeError> {
    URL_SAFE_PAD.decode(s)
}
