//! Recursive value-level encryption for JSON documents.
//!
//! Every primitive leaf (string, number, boolean) of an arbitrarily nested
//! JSON document is ciphered individually with AES in counter mode, producing
//! a hex token that embeds a per-value random iv and a one-byte type tag.
//! Deciphering restores each leaf to its original primitive type, and the
//! document's structure (object keys, array order, nesting) is untouched in
//! both directions.
//!
//! ```
//! use json_cipher::{Action, ValueCipher};
//! use serde_json::json;
//!
//! let cipher = ValueCipher::new("My secret password");
//! let doc = json!({"a": 1, "b": true});
//!
//! let ciphered = cipher.perform(Action::Cipher, &doc).unwrap();
//! assert!(ciphered["a"].is_string());
//!
//! let restored = cipher.perform(Action::Decipher, &ciphered).unwrap();
//! assert_eq!(restored, doc);
//! ```
//!
//! The scheme is deliberately unauthenticated (no integrity tag): a token
//! deciphered with the wrong key yields garbage rather than a clean
//! rejection. See [`ValueCipher::decipher`] for the failure modes that *are*
//! detected.

pub mod cipher;
pub mod error;
pub mod options;
pub mod walk;

pub use cipher::{Action, ValueCipher};
pub use error::CipherError;
pub use options::{Algorithm, CipherOptions};
