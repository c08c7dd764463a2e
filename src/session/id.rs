//! Session identifier type.

use std::fmt;
use std::str::FromStr;

use rand::Rng;

use super::RuntimeError;

/// Default number of characters in a generated ID.
pub const DEFAULT_SID_LENGTH: usize = 32;

/// Default number of bits encoded per ID character.
pub const DEFAULT_SID_BITS: u8 = 4;

/// Accepted range for `sid_length`.
pub const SID_LENGTH_RANGE: std::ops::RangeInclusive<usize> = 22..=256;

/// Accepted range for `sid_bits_per_character`.
pub const SID_BITS_RANGE: std::ops::RangeInclusive<u8> = 4..=6;

const ALPHABET: &[u8; 64] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ-,";

/// Identifier of a session record.
///
/// Generated IDs are random strings over an alphabet of `2^bits` characters,
/// so `bits = 4` yields lowercase hex. IDs supplied by a client are accepted
/// as long as they only use characters from the 6-bit alphabet.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a new random ID with the default length and alphabet.
    pub fn generate() -> Self {
        Self::generate_with(DEFAULT_SID_LENGTH, DEFAULT_SID_BITS)
    }

    /// Generate a new random ID of `length` characters, `bits` bits each.
    ///
    /// Out-of-range arguments are clamped to the accepted ranges.
    pub fn generate_with(length: usize, bits: u8) -> Self {
        let length = length.clamp(*SID_LENGTH_RANGE.start(), *SID_LENGTH_RANGE.end());
        let bits = bits.clamp(*SID_BITS_RANGE.start(), *SID_BITS_RANGE.end());
        let alphabet = &ALPHABET[..1 << bits];

        let mut rng = rand::rng();
        let id = (0..length)
            .map(|_| alphabet[rng.random_range(0..alphabet.len())] as char)
            .collect();
        Self(id)
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SessionId {
    type Err = RuntimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| ALPHABET.contains(&b)) {
            return Err(RuntimeError::InvalidId(s.into()));
        }
        Ok(Self(s.to_string()))
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
