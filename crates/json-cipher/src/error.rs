//! Error types for the value cipher.

use thiserror::Error;

/// Errors produced by the cipher layer.
///
/// Note the absence of a "wrong key" variant: with an unauthenticated stream
/// cipher, deciphering under the wrong key usually produces garbage plaintext
/// instead of an error. That garbage then surfaces as
/// [`CipherError::DecryptionFailure`] when it is not valid UTF-8 or fails the
/// numeric coercion of an `n`-tagged value, or it silently decodes to a
/// nonsensical string. There is no integrity tag to detect tampering.
#[derive(Debug, Error)]
pub enum CipherError {
    /// The token cannot be parsed: shorter than its iv prefix, non-hex
    /// characters, no type tag byte, or not a string at all.
    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// Decryption produced plaintext that cannot be coerced back to the
    /// tagged primitive type.
    #[error("decryption failure: {0}")]
    DecryptionFailure(String),

    /// The action string is outside the recognized set
    /// (`cipher`/`encrypt`/`decipher`/`decrypt`).
    #[error("unsupported action: {0:?}")]
    UnsupportedAction(String),

    /// The algorithm identifier names no supported cipher.
    #[error("unsupported algorithm: {0:?}")]
    UnsupportedAlgorithm(String),

    /// The configured iv length is incompatible with the algorithm's block
    /// size. Surfaced at cipher/decipher time; construction never fails.
    #[error("invalid iv length for {algo}: requires {required} bytes, got {got}")]
    InvalidIvLength {
        /// Algorithm identifier, e.g. `"aes-256-ctr"`.
        algo: &'static str,
        /// Required iv length in bytes.
        required: usize,
        /// The iv length actually supplied.
        got: usize,
    },
}
