/**
 * Client-side cryptography.
 *  - Per-secret key and IV generation
 *  - AES-256-CBC encrypt / decrypt over base64
 */
pub mod crypto;
/**
 * Opaque, URL-safe identifiers for stored secrets.
 */
pub mod record_id;
/**
 * Share link codec. Puts the key material in the
 *  URL fragment so it never reaches the relay.
 */
pub mod share_link;
/**
 * Read-once, expiring storage for encrypted payloads.
 * In-process and Redis backends behind one trait.
 */
pub mod store;
/**
 * Helper for setting build version information
 *  at compile time.
 */
pub mod version;

pub mod prelude {
    pub use crate::crypto::{decrypt, encrypt, CryptoError, EncryptionMaterial};
    pub use crate::record_id::{RecordId, RecordIdError};
    pub use crate::share_link::{build_share_url, parse_share_url, ShareLink, ShareLinkError};
    pub use crate::store::{
        DynSecretStore, EncryptedPayload, MemoryStore, RedisStore, SecretStore, StoreConfig,
        StoreError,
    };
    pub use crate::version::build_info;
}
