use std::fmt;
use std::str::FromStr;

use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Number of symbols in a generated id
pub const RECORD_ID_LEN: usize = 16;

/// URL-safe alphabet; 64 symbols so each one carries exactly 6 bits
const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Opaque identifier of a stored secret
///
/// Generated ids are 16 symbols from a 64-symbol URL-safe alphabet, giving
/// 96 bits of entropy. Ids received from clients are only checked for being
/// non-empty, URL-safe and bounded in length; they are never trusted to be
/// well distributed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordId(String);

impl RecordId {
    /// Upper bound on accepted id length
    pub const MAX_LEN: usize = 64;

    pub fn generate() -> Self {
        let mut bytes = [0u8; RECORD_ID_LEN];
        rand::rng().fill_bytes(&mut bytes);
        let id = bytes
            .iter()
            .map(|b| ALPHABET[(b & 63) as usize] as char)
            .collect();
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RecordId {
    type Err = RecordIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(RecordIdError::Empty);
        }
        if s.len() > Self::MAX_LEN {
            return Err(RecordIdError::TooLong(s.len()));
        }
        if !s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            return Err(RecordIdError::InvalidCharacter);
        }
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for RecordId {
    type Error = RecordIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordIdError {
    #[error("record id is empty")]
    Empty,
    #[error("record id is too long ({0} bytes)")]
    TooLong(usize),
    #[error("record id contains characters outside [A-Za-z0-9_-]")]
    InvalidCharacter,
}
