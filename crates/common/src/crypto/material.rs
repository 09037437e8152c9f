use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::RngCore;

use super::CryptoError;

/// Size of the AES-256 key in bytes
pub const KEY_SIZE: usize = 32;
/// Size of the CBC initialization vector in bytes (one AES block)
pub const IV_SIZE: usize = 16;

/// Per-secret key and IV
///
/// Generated once per secret on the sender's device and handed to the reader
/// inside the share link fragment. Never sent to, or stored by, the relay.
///
/// # Examples
///
/// ```
/// use common::crypto::EncryptionMaterial;
///
/// let material = EncryptionMaterial::generate();
/// let parsed = EncryptionMaterial::from_base64(&material.key_b64(), &material.iv_b64()).unwrap();
/// assert_eq!(material, parsed);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptionMaterial {
    key: [u8; KEY_SIZE],
    iv: [u8; IV_SIZE],
}

impl EncryptionMaterial {
    /// Draw a fresh key and IV from the thread-local CSPRNG
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let mut key = [0u8; KEY_SIZE];
        let mut iv = [0u8; IV_SIZE];
        rng.fill_bytes(&mut key);
        rng.fill_bytes(&mut iv);
        Self { key, iv }
    }

    pub fn from_parts(key: [u8; KEY_SIZE], iv: [u8; IV_SIZE]) -> Self {
        Self { key, iv }
    }

    /// Parse material from its external base64 representation
    ///
    /// # Errors
    ///
    /// Fails if either value is not valid standard base64 or decodes to the
    /// wrong number of bytes.
    pub fn from_base64(key_b64: &str, iv_b64: &str) -> Result<Self, CryptoError> {
        let key = decode_exact::<KEY_SIZE>("key", key_b64)?;
        let iv = decode_exact::<IV_SIZE>("iv", iv_b64)?;
        Ok(Self { key, iv })
    }

    pub fn key(&self) -> &[u8; KEY_SIZE] {
        &self.key
    }

    pub fn iv(&self) -> &[u8; IV_SIZE] {
        &self.iv
    }

    pub fn key_b64(&self) -> String {
        STANDARD.encode(self.key)
    }

    pub fn iv_b64(&self) -> String {
        STANDARD.encode(self.iv)
    }
}

// keep the key out of logs and panic messages
impl fmt::Debug for EncryptionMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionMaterial")
            .field("key", &"<redacted>")
            .field("iv", &self.iv_b64())
            .finish()
    }
}

fn decode_exact<const N: usize>(what: &'static str, value: &str) -> Result<[u8; N], CryptoError> {
    let bytes = STANDARD.decode(value)?;
    if bytes.len() != N {
        return Err(CryptoError::InvalidLength {
            what,
            expected: N,
            actual: bytes.len(),
        });
    }
    let mut buff = [0u8; N];
    buff.copy_from_slice(&bytes);
    Ok(buff)
}
