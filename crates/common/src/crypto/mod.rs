//! Client-side cryptography for SecureShare
//!
//! Everything in this module runs on the sender's or reader's device. The relay
//! only ever sees the output of [`encrypt`] together with the IV, never the key.
//!
//! # Scheme
//!
//! - **Key material**: a fresh 256-bit key and 128-bit IV per secret, drawn from
//!   the operating system seeded CSPRNG and carried around as standard base64.
//! - **Cipher**: AES-256 in CBC mode with PKCS#7 padding over the UTF-8 bytes of
//!   the secret. Ciphertext is exchanged as standard base64.
//!
//! # Caveat: no authentication tag
//!
//! CBC provides confidentiality only. Decrypting with the wrong key or IV is
//! detected only when the recovered padding (or UTF-8) happens to be invalid;
//! otherwise garbage plaintext comes back without an error. Tampered ciphertext
//! behaves the same way. This matches the wire format existing clients speak,
//! so switching to an AEAD would be a protocol version bump, not a patch.

mod cipher;
mod material;

pub use cipher::{decrypt, encrypt};
pub use material::{EncryptionMaterial, IV_SIZE, KEY_SIZE};

/// Errors raised by the crypto engine
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// Input was not valid standard base64
    #[error("invalid base64: {0}")]
    Encoding(#[from] base64::DecodeError),
    /// Key or IV decoded to the wrong number of bytes
    #[error("invalid {what} length, expected {expected}, got {actual}")]
    InvalidLength {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    /// Decryption produced structurally invalid output (bad padding,
    /// truncated block or non UTF-8 plaintext)
    #[error("decryption failed integrity checks")]
    Integrity,
}
