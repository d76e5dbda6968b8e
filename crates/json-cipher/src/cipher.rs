//! AES-CTR ciphering of individual JSON leaf values.
//!
//! Each leaf is ciphered whole, in memory, under a key derived once from the
//! caller's secret. The token for one leaf is
//! `hex(iv) || hex(tag || string(value))` where `tag` is a single byte
//! identifying the original primitive type, so deciphering restores a number
//! as a number and a boolean as a boolean rather than collapsing everything
//! to text.
//!
//! **This scheme is unauthenticated.** There is no integrity tag: bit flips
//! and wrong keys are not detected, they just produce different plaintext.
//! Kept that way on purpose for token-format compatibility; do not reuse
//! this module where tamper detection matters.

use aes::{Aes128, Aes256};
use ctr::cipher::{KeyIvInit, StreamCipher};
use rand::rngs::OsRng;
use rand::RngCore;
use serde_json::{Number, Value};
use sha2::{Digest, Sha256};

use crate::error::CipherError;
use crate::options::{Algorithm, CipherOptions};
use crate::walk;

type Aes256CtrBE = ctr::Ctr128BE<Aes256>;
type Aes128CtrBE = ctr::Ctr128BE<Aes128>;

// Type tags prefixed to every plaintext before encryption.
const TAG_STRING: u8 = b's';
const TAG_NUMBER: u8 = b'n';
const TAG_BOOLEAN: u8 = b'b';

/// What [`ValueCipher::perform`] should do to a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Encrypt every leaf into a hex token.
    Cipher,
    /// Decrypt every leaf token back to its original primitive.
    Decipher,
}

impl Action {
    /// Lowercase name for logging and messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Cipher => "cipher",
            Action::Decipher => "decipher",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Action {
    type Err = CipherError;

    /// Both spellings are accepted as synonyms: `cipher`/`encrypt` and
    /// `decipher`/`decrypt`. Anything else fails loudly.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cipher" | "encrypt" => Ok(Action::Cipher),
            "decipher" | "decrypt" => Ok(Action::Decipher),
            other => Err(CipherError::UnsupportedAction(other.to_owned())),
        }
    }
}

/// Fixed-size key buffer derived from the secret.
///
/// Zeroed on drop and redacted in debug output so key material neither
/// outlives the cipher nor leaks into logs.
struct KeyBytes(Box<[u8]>);

impl Drop for KeyBytes {
    fn drop(&mut self) {
        self.0.iter_mut().for_each(|b| *b = 0);
    }
}

impl std::fmt::Debug for KeyBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("KeyBytes([REDACTED])")
    }
}

/// Ciphers and deciphers the primitive values of JSON documents.
///
/// Immutable after construction: every method takes `&self`, each call
/// allocates its own iv and buffers, so one instance may be shared freely
/// across threads and reused for any number of documents.
#[derive(Debug)]
pub struct ValueCipher {
    key: KeyBytes,
    algo: Algorithm,
    iv_length: usize,
}

impl ValueCipher {
    /// Create a cipher with default options (AES-256-CTR, 16-byte iv).
    ///
    /// The key is `Sha256(secret)` — a single unsalted hash, no iteration
    /// count, no strength validation. An empty secret is accepted.
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self::with_options(secret, CipherOptions::default())
    }

    /// Create a cipher with explicit [`CipherOptions`].
    ///
    /// For AES-128 the 32-byte digest is truncated to the 16-byte key
    /// length. Construction never fails; an iv length incompatible with the
    /// algorithm surfaces as [`CipherError::InvalidIvLength`] on first use.
    pub fn with_options(secret: impl AsRef<[u8]>, options: CipherOptions) -> Self {
        let digest = Sha256::digest(secret.as_ref());
        let key = KeyBytes(digest[..options.algo.key_len()].into());
        Self {
            key,
            algo: options.algo,
            iv_length: options.iv_length,
        }
    }

    /// The configured algorithm.
    pub fn algo(&self) -> Algorithm {
        self.algo
    }

    /// The configured iv length in bytes.
    pub fn iv_length(&self) -> usize {
        self.iv_length
    }

    /// Cipher a single leaf value into a lowercase hex token.
    ///
    /// A fresh iv is drawn from the OS CSPRNG on every call, so ciphering
    /// the same value twice yields different tokens. Values that are not
    /// string, number, or boolean (i.e. `null`) are coerced to their textual
    /// form and tagged as strings.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::InvalidIvLength`] if the configured iv length
    /// does not match the algorithm's block size.
    pub fn cipher(&self, value: &Value) -> Result<String, CipherError> {
        let mut iv = vec![0u8; self.iv_length];
        OsRng.fill_bytes(&mut iv);

        let mut buf = plaintext_bytes(value);
        self.apply_keystream(&iv, &mut buf)?;

        let mut token = hex::encode(&iv);
        token.push_str(&hex::encode(&buf));
        Ok(token)
    }

    /// Decipher a single token back to its original primitive value.
    ///
    /// The first `2 * iv_length` hex characters are the iv; the remainder is
    /// the ciphertext of `tag || string(value)`. The tag byte drives the
    /// coercion: `n` parses the text as an integer first (so `13` does not
    /// come back as `13.0`), then as a float; `b` is `true` iff the text is
    /// the literal `"true"`; `s` or any unrecognized tag is the text
    /// unchanged.
    ///
    /// # Errors
    ///
    /// - [`CipherError::MalformedToken`] — token shorter than the iv prefix,
    ///   non-hex characters, or no tag byte.
    /// - [`CipherError::DecryptionFailure`] — plaintext not valid UTF-8, or
    ///   an `n`-tagged value that is not numeric (the typical symptom of a
    ///   key mismatch; see the module docs on the lack of authentication).
    /// - [`CipherError::InvalidIvLength`] — configured iv length rejected by
    ///   the cipher.
    pub fn decipher(&self, token: &str) -> Result<Value, CipherError> {
        if !token.is_ascii() {
            return Err(CipherError::MalformedToken(
                "token contains non-hex characters".into(),
            ));
        }
        let iv_hex_len = 2 * self.iv_length;
        if token.len() < iv_hex_len {
            return Err(CipherError::MalformedToken(format!(
                "token is {} chars, shorter than its {iv_hex_len}-char iv prefix",
                token.len()
            )));
        }

        let (iv_hex, ciphertext_hex) = token.split_at(iv_hex_len);
        let iv = hex::decode(iv_hex)
            .map_err(|e| CipherError::MalformedToken(format!("iv prefix is not hex: {e}")))?;
        let mut buf = hex::decode(ciphertext_hex)
            .map_err(|e| CipherError::MalformedToken(format!("ciphertext is not hex: {e}")))?;

        self.apply_keystream(&iv, &mut buf)?;

        let Some((&tag, rest)) = buf.split_first() else {
            return Err(CipherError::MalformedToken(
                "token carries no type tag".into(),
            ));
        };
        let text = std::str::from_utf8(rest).map_err(|_| {
            CipherError::DecryptionFailure("decrypted plaintext is not valid UTF-8".into())
        })?;
        coerce(tag, text)
    }

    /// Apply `action` to every leaf of `document`, returning a structural
    /// clone with transformed values. The input is never mutated.
    ///
    /// # Errors
    ///
    /// Propagates the first [`CipherError`] raised by [`Self::cipher`] or
    /// [`Self::decipher`] on any leaf; nothing is caught or suppressed here.
    /// Deciphering a leaf that is not a string is a
    /// [`CipherError::MalformedToken`].
    pub fn perform(&self, action: Action, document: &Value) -> Result<Value, CipherError> {
        match action {
            Action::Cipher => {
                walk::transform(document, &mut |leaf| self.cipher(leaf).map(Value::String))
            }
            Action::Decipher => walk::transform(document, &mut |leaf| match leaf {
                Value::String(token) => self.decipher(token),
                other => Err(CipherError::MalformedToken(format!(
                    "expected a ciphered token string, found {other}"
                ))),
            }),
        }
    }

    /// Run the CTR keystream over `buf` in place. Encryption and decryption
    /// are the same operation in counter mode.
    fn apply_keystream(&self, iv: &[u8], buf: &mut [u8]) -> Result<(), CipherError> {
        let invalid_iv = |got: usize| CipherError::InvalidIvLength {
            algo: self.algo.as_str(),
            required: self.algo.iv_len(),
            got,
        };

        match self.algo {
            Algorithm::Aes256Ctr => Aes256CtrBE::new_from_slices(&self.key.0, iv)
                .map_err(|_| invalid_iv(iv.len()))?
                .apply_keystream(buf),
            Algorithm::Aes128Ctr => Aes128CtrBE::new_from_slices(&self.key.0, iv)
                .map_err(|_| invalid_iv(iv.len()))?
                .apply_keystream(buf),
        }
        Ok(())
    }
}

/// `tag || string(value)` for one leaf.
fn plaintext_bytes(value: &Value) -> Vec<u8> {
    let (tag, text) = match value {
        Value::String(s) => (TAG_STRING, s.clone()),
        Value::Number(n) => (TAG_NUMBER, n.to_string()),
        Value::Bool(b) => (TAG_BOOLEAN, b.to_string()),
        // Any other leaf (null) is ciphered as its textual form and will
        // decipher as a string.
        other => (TAG_STRING, other.to_string()),
    };

    let mut buf = Vec::with_capacity(1 + text.len());
    buf.push(tag);
    buf.extend_from_slice(text.as_bytes());
    buf
}

/// Coerce decrypted plaintext back to a primitive per its tag byte.
fn coerce(tag: u8, text: &str) -> Result<Value, CipherError> {
    Ok(match tag {
        TAG_NUMBER => Value::Number(parse_number(text)?),
        TAG_BOOLEAN => Value::Bool(text == "true"),
        // TAG_STRING and any unrecognized tag.
        _ => Value::String(text.to_owned()),
    })
}

/// Integer-first numeric parse, so whole numbers keep their JSON integer
/// representation on round trip.
fn parse_number(text: &str) -> Result<Number, CipherError> {
    if let Ok(i) = text.parse::<i64>() {
        return Ok(Number::from(i));
    }
    if let Ok(u) = text.parse::<u64>() {
        return Ok(Number::from(u));
    }
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .ok_or_else(|| {
            CipherError::DecryptionFailure(format!(
                "number-tagged plaintext {text:?} is not numeric"
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SECRET: &str = "My secret password";

    fn default_cipher() -> ValueCipher {
        ValueCipher::new(SECRET)
    }

    #[test]
    fn defaults_are_exposed() {
        let c = default_cipher();
        assert_eq!(c.algo().as_str(), "aes-256-ctr");
        assert_eq!(c.iv_length(), 16);
    }

    #[test]
    fn leaf_round_trip_preserves_type_and_value() {
        let c = default_cipher();
        let leaves = [
            json!("hello"),
            json!(""),
            json!(13),
            json!(0),
            json!(-7),
            json!(45.2),
            json!(true),
            json!(false),
        ];
        for leaf in leaves {
            let token = c.cipher(&leaf).unwrap();
            let back = c.decipher(&token).unwrap();
            assert_eq!(back, leaf, "round trip changed {leaf}");
        }
    }

    #[test]
    fn integers_do_not_come_back_as_floats() {
        let c = default_cipher();
        let back = c.decipher(&c.cipher(&json!(13)).unwrap()).unwrap();
        assert_eq!(back.to_string(), "13");
        assert!(back.is_i64() || back.is_u64());
    }

    #[test]
    fn null_deciphers_as_the_string_null() {
        let c = default_cipher();
        let back = c.decipher(&c.cipher(&Value::Null).unwrap()).unwrap();
        assert_eq!(back, json!("null"));
    }

    #[test]
    fn token_is_lowercase_hex_with_iv_prefix() {
        let c = default_cipher();
        let token = c.cipher(&json!(1)).unwrap();
        // 32 hex chars of iv + 2 of tag + 2 of the single digit.
        assert_eq!(token.len(), 36);
        assert!(token.chars().all(|ch| ch.is_ascii_hexdigit()));
        assert!(!token.chars().any(|ch| ch.is_ascii_uppercase()));
    }

    #[test]
    fn ciphertext_is_probabilistic() {
        let c = default_cipher();
        let v = json!("same value");
        let t1 = c.cipher(&v).unwrap();
        let t2 = c.cipher(&v).unwrap();
        assert_ne!(t1, t2);
        // Fresh iv each call.
        assert_ne!(&t1[..32], &t2[..32]);
    }

    #[test]
    fn wrong_key_never_reproduces_the_value() {
        let c = default_cipher();
        let other = ValueCipher::new("a different secret");
        let v = json!("attack at dawn");
        let token = c.cipher(&v).unwrap();
        // Without authentication, a wrong key either errors out of the UTF-8
        // or numeric coercion, or yields a nonsensical value. Never the
        // original.
        match other.decipher(&token) {
            Ok(back) => assert_ne!(back, v),
            Err(e) => assert!(matches!(e, CipherError::DecryptionFailure(_))),
        }
    }

    #[test]
    fn action_parsing_accepts_both_spellings() {
        assert_eq!("cipher".parse::<Action>().unwrap(), Action::Cipher);
        assert_eq!("encrypt".parse::<Action>().unwrap(), Action::Cipher);
        assert_eq!("decipher".parse::<Action>().unwrap(), Action::Decipher);
        assert_eq!("decrypt".parse::<Action>().unwrap(), Action::Decipher);

        let err = "rot13".parse::<Action>().unwrap_err();
        assert!(matches!(err, CipherError::UnsupportedAction(_)));
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        let c = default_cipher();

        // Shorter than the iv prefix.
        let err = c.decipher("abc123").unwrap_err();
        assert!(matches!(err, CipherError::MalformedToken(_)));

        // Right length, not hex.
        let err = c.decipher(&"zz".repeat(20)).unwrap_err();
        assert!(matches!(err, CipherError::MalformedToken(_)));

        // Non-ASCII garbage.
        let err = c.decipher("héllo").unwrap_err();
        assert!(matches!(err, CipherError::MalformedToken(_)));

        // Valid iv, empty ciphertext: no tag byte to read.
        let err = c.decipher(&"ab".repeat(16)).unwrap_err();
        assert!(matches!(err, CipherError::MalformedToken(_)));
    }

    #[test]
    fn incompatible_iv_length_errors_on_use_not_construction() {
        let opts = CipherOptions {
            iv_length: 12,
            ..CipherOptions::default()
        };
        let c = ValueCipher::with_options(SECRET, opts);
        let err = c.cipher(&json!("x")).unwrap_err();
        assert!(matches!(
            err,
            CipherError::InvalidIvLength {
                required: 16,
                got: 12,
                ..
            }
        ));
    }

    #[test]
    fn aes_128_ctr_round_trips_too() {
        let opts = CipherOptions {
            algo: Algorithm::Aes128Ctr,
            ..CipherOptions::default()
        };
        let c = ValueCipher::with_options(SECRET, opts);
        let back = c.decipher(&c.cipher(&json!(42)).unwrap()).unwrap();
        assert_eq!(back, json!(42));
    }

    #[test]
    fn perform_round_trips_a_flat_document() {
        let c = default_cipher();
        let doc = json!({"a": 1, "b": true});

        let ciphered = c.perform(Action::Cipher, &doc).unwrap();
        for key in ["a", "b"] {
            let token = ciphered[key].as_str().expect("ciphered leaf is a string");
            assert!(token.len() > 32);
            assert!(token.chars().all(|ch| ch.is_ascii_hexdigit()));
        }

        let back = c.perform(Action::Decipher, &ciphered).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn perform_round_trips_nested_mixed_documents() {
        let c = default_cipher();
        let doc = json!(["a", 13, {"a": 4, "b": {"ba": 45.2, "bb": false}}]);
        let back = c
            .perform(Action::Decipher, &c.perform(Action::Cipher, &doc).unwrap())
            .unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn ciphering_changes_values_never_structure() {
        let c = default_cipher();
        let doc = json!({
            "a": "a value",
            "b": {"a": "x", "b": "yy"},
            "c": {"x": "a", "y": {"ya": 123, "yb": ["X", "Y", "Z"]}},
            "e": ["a", 13, {"empty": {}, "none": []}]
        });
        let ciphered = c.perform(Action::Cipher, &doc).unwrap();

        // Mapping every leaf of both trees to a constant reveals identical
        // shapes: same keys, same array lengths, same nesting.
        let mut strip = |_: &Value| -> Result<Value, std::convert::Infallible> {
            Ok(Value::Null)
        };
        let shape_before = walk::transform(&doc, &mut strip).unwrap();
        let shape_after = walk::transform(&ciphered, &mut strip).unwrap();
        assert_eq!(shape_before, shape_after);
    }

    #[test]
    fn perform_decipher_rejects_non_string_leaves() {
        let c = default_cipher();
        let err = c.perform(Action::Decipher, &json!({"a": 1})).unwrap_err();
        assert!(matches!(err, CipherError::MalformedToken(_)));
    }

    #[test]
    fn shared_instance_is_usable_across_threads() {
        let c = std::sync::Arc::new(default_cipher());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let c = std::sync::Arc::clone(&c);
                std::thread::spawn(move || {
                    let v = json!(format!("value-{i}"));
                    let back = c.decipher(&c.cipher(&v).unwrap()).unwrap();
                    assert_eq!(back, v);
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
    }

    #[test]
    fn key_material_is_redacted_in_debug() {
        let c = default_cipher();
        assert!(format!("{c:?}").contains("REDACTED"));
    }
}
