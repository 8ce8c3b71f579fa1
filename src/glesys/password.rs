//! Root password generation.

use rand::Rng;
use rand::rngs::OsRng;

use crate::error::{GlesysError, Result};

/// Symbols a generated password is drawn from. Look-alike glyphs
/// (`I`, `O`, `0`, `1`) are left out.
pub const PASSWORD_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Shortest password length accepted.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Length used when the desired configuration leaves the password blank.
pub const GENERATED_PASSWORD_LENGTH: usize = 64;

/// Generates a random password of `length` symbols from [`PASSWORD_ALPHABET`].
///
/// Each symbol is drawn independently and uniformly from the operating
/// system's random source.
///
/// # Errors
///
/// Returns an invalid-argument error if `length` is below
/// [`MIN_PASSWORD_LENGTH`].
pub fn generate_password(length: usize) -> Result<String> {
    if length < MIN_PASSWORD_LENGTH {
        return Err(GlesysError::invalid_argument(format!(
            "password length must be at least {MIN_PASSWORD_LENGTH}, got {length}"
        )));
    }

    let mut rng = OsRng;
    Ok((0..length)
        .map(|_| char::from(PASSWORD_ALPHABET[rng.gen_range(0..PASSWORD_ALPHABET.len())]))
        .collect())
}
