//! Random suffixes appended to uploaded filenames.

use crate::errors::RandomError;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{TryRngCore, rngs::OsRng};

/// Length of the suffix appended to upload keys.
pub const KEY_SUFFIX_LEN: usize = 10;

pub trait KeySuffixGenerator: Send + Sync {
    /// Return a URL-safe string of exactly `length` characters.
    fn generate(&self, length: usize) -> Result<String, RandomError>;
}

/// Draws from the operating system's entropy source.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl KeySuffixGenerator for OsRandom {
    fn generate(&self, length: usize) -> Result<String, RandomError> {
        let mut bytes = vec![0u8; (length * 6).div_ceil(8)];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| RandomError::Entropy(e.to_string()))?;

        let mut encoded = URL_SAFE_NO_PAD.encode(&bytes);
        encoded.truncate(length);
        Ok(encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_requested_length() {
        for length in [1, 4, 7, KEY_SUFFIX_LEN, 32] {
            assert_eq!(OsRandom.generate(length).unwrap().len(), length);
        }
    }

    #[test]
    fn zero_length_is_empty() {
        assert_eq!(OsRandom.generate(0).unwrap(), "");
    }

    #[test]
    fn uses_url_safe_alphabet() {
        let suffix = OsRandom.generate(64).unwrap();

        assert!(
            suffix
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn consecutive_calls_differ() {
        let a = OsRandom.generate(KEY_SUFFIX_LEN).unwrap();
        let b = OsRandom.generate(KEY_SUFFIX_LEN).unwrap();

        assert_ne!(a, b);
    }
}
