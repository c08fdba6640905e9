//! Prefixed identifiers
//!
//! Identifiers look like `usr_3q2-7wEjd7bd0R8x`: a short type prefix followed by
//! 96 bits of randomness encoded as URL-safe base64.

use base64::{Engine, prelude::BASE64_URL_SAFE_NO_PAD};
use rand::RngCore;

const ID_ENTROPY_BYTES: usize = 12;

/// Generate a prefixed ID with 96 bits of entropy
pub fn generate_prefixed_id(prefix: &str) -> String {
    let mut bytes = [0u8; ID_ENTROPY_BYTES];
    rand::rng().fill_bytes(&mut bytes);

    let encoded = BASE64_URL_SAFE_NO_PAD.encode(bytes);
    format!("{prefix}_{encoded}")
}

/// Check that `id` is `{expected_prefix}_` followed by at least 96 bits of base64
pub fn validate_prefixed_id(id: &str, expected_prefix: &str) -> bool {
    let Some(random_part) = id
        .strip_prefix(expected_prefix)
        .and_then(|rest| rest.strip_prefix('_'))
    else {
        return false;
    };

    BASE64_URL_SAFE_NO_PAD
        .decode(random_part)
        .is_ok_and(|decoded| decoded.len() >= ID_ENTROPY_BYTES)
}
