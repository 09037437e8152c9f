//! AES-256-CBC with PKCS#7 padding
//!
//! Byte-compatible with the CryptoJS `AES.encrypt(.., { mode: CBC, padding: Pkcs7 })`
//! output the mobile and web clients produce, so a secret sealed by any client
//! can be opened by any other.

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::{CryptoError, EncryptionMaterial};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Encrypt `plaintext` and return the base64 ciphertext
///
/// Deterministic for a given (plaintext, key, iv) triple.
pub fn encrypt(plaintext: &str, material: &EncryptionMaterial) -> String {
    let cipher = Aes256CbcEnc::new(material.key().into(), material.iv().into());
    let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());
    STANDARD.encode(ciphertext)
}

/// Decrypt a base64 ciphertext produced by [`encrypt`]
///
/// # Errors
///
/// - [`CryptoError::Encoding`] if the ciphertext is not valid base64
/// - [`CryptoError::Integrity`] if the ciphertext is not a whole number of
///   blocks, the padding is invalid or the plaintext is not UTF-8
///
/// A wrong key can still yield `Ok` with meaningless text; see the module docs.
pub fn decrypt(cipher_text_b64: &str, material: &EncryptionMaterial) -> Result<String, CryptoError> {
    let ciphertext = STANDARD.decode(cipher_text_b64)?;
    let cipher = Aes256CbcDec::new(material.key().into(), material.iv().into());
    let plaintext = cipher
        .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
        .map_err(|_| CryptoError::Integrity)?;
    String::from_utf8(plaintext).map_err(|_| CryptoError::Integrity)
}
