//! Caesar-style shift cipher over a configurable alphabet.
//!
//! This only obscures text. It offers no secrecy against anyone who cares
//! to look.

use crate::error::{ClackError, Result};
use std::collections::HashSet;

/// Alphabet used when none is given.
pub const DEFAULT_ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// A keyed shift transform along `alphabet`.
///
/// Characters outside the alphabet are copied through unchanged, so
/// `decrypt(encrypt(s)) == s` for any input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CaesarCipher {
    /// Always in `0..alphabet.len()`.
    key: usize,
    alphabet: Vec<char>,
}

impl CaesarCipher {
    /// Create a cipher with the given key and alphabet.
    ///
    /// Fails when the key is zero, the alphabet is empty, or the alphabet
    /// contains the same character twice.
    pub fn new(key: i64, alphabet: &str) -> Result<Self> {
        if key == 0 {
            return Err(ClackError::InvalidConfiguration(
                "key of zero not allowed".to_string(),
            ));
        }

        let alphabet: Vec<char> = alphabet.chars().collect();
        if alphabet.is_empty() {
            return Err(ClackError::InvalidConfiguration(
                "empty alphabet not allowed".to_string(),
            ));
        }

        let mut seen = HashSet::with_capacity(alphabet.len());
        if let Some(dup) = alphabet.iter().find(|ch| !seen.insert(**ch)) {
            return Err(ClackError::InvalidConfiguration(format!(
                "duplicate character '{}' in alphabet",
                dup
            )));
        }

        let key = normalize(key, alphabet.len());
        Ok(Self { key, alphabet })
    }

    /// Create a cipher over [`DEFAULT_ALPHABET`].
    pub fn with_default_alphabet(key: i64) -> Result<Self> {
        Self::new(key, DEFAULT_ALPHABET)
    }

    pub fn key(&self) -> usize {
        self.key
    }

    pub fn alphabet(&self) -> String {
        self.alphabet.iter().collect()
    }

    pub fn encrypt(&self, clear_text: &str) -> String {
        self.shift_chars(clear_text, self.key)
    }

    pub fn decrypt(&self, cipher_text: &str) -> String {
        // key is already in range, so this never underflows
        self.shift_chars(cipher_text, (self.alphabet.len() - self.key) % self.alphabet.len())
    }

    fn shift_chars(&self, text: &str, shift: usize) -> String {
        let len = self.alphabet.len();
        text.chars()
            .map(|ch| match self.alphabet.iter().position(|a| *a == ch) {
                Some(loc) => self.alphabet[(loc + shift) % len],
                None => ch,
            })
            .collect()
    }
}

/// Floored modulo, so negative keys shift backwards.
fn normalize(key: i64, len: usize) -> usize {
    key.rem_euclid(len as i64) as usize
}
