//! Cryptographic helpers for credential checks
//!
//! Comparisons on secret material must not exit early on the first mismatching
//! byte.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use subtle::ConstantTimeEq;

/// Generate a 256-bit random token encoded as URL-safe base64 (43 characters).
pub fn generate_secure_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Compare two byte slices in constant time.
///
/// The running time depends only on the lengths of the inputs, never on where
/// (or whether) their contents differ.
///
/// # Arguments
///
/// * `a` - First byte slice
/// * `b` - Second byte slice
///
/// # Returns
///
/// `true` if the slices are equal, `false` otherwise
pub fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
