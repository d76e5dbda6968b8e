//! Cipher configuration: algorithm selection and iv length.

use std::fmt;
use std::str::FromStr;

use crate::error::CipherError;

/// Symmetric algorithms supported for value ciphering.
///
/// Both are AES in counter mode: stream ciphers that need no padding, so a
/// leaf's ciphertext is exactly as long as its plaintext.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Algorithm {
    /// AES-256-CTR (the default).
    #[default]
    Aes256Ctr,
    /// AES-128-CTR.
    Aes128Ctr,
}

impl Algorithm {
    /// Key length in bytes (32 for AES-256, 16 for AES-128).
    pub fn key_len(self) -> usize {
        match self {
            Algorithm::Aes256Ctr => 32,
            Algorithm::Aes128Ctr => 16,
        }
    }

    /// Required iv length in bytes — the AES block size for both variants.
    pub fn iv_len(self) -> usize {
        16
    }

    /// Canonical identifier, e.g. `"aes-256-ctr"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Algorithm::Aes256Ctr => "aes-256-ctr",
            Algorithm::Aes128Ctr => "aes-128-ctr",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = CipherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aes-256-ctr" => Ok(Algorithm::Aes256Ctr),
            "aes-128-ctr" => Ok(Algorithm::Aes128Ctr),
            other => Err(CipherError::UnsupportedAlgorithm(other.to_owned())),
        }
    }
}

/// Settings for a [`crate::ValueCipher`].
///
/// The same settings must be used for deciphering as were used for
/// ciphering: a token embeds its iv but not the algorithm or iv length.
#[derive(Debug, Clone)]
pub struct CipherOptions {
    /// Symmetric cipher to apply per leaf value.
    pub algo: Algorithm,
    /// Length in bytes of the per-value random iv. Must match the
    /// algorithm's block size (16) for ciphering to succeed.
    pub iv_length: usize,
}

impl Default for CipherOptions {
    fn default() -> Self {
        Self {
            algo: Algorithm::default(),
            iv_length: 16,
        }
    }
}
