//! [`DerivedKey`]: the process-wide AES-256 key stretched from the master secret.

use std::fmt;

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;

/// Byte length of an AES-256 key (32 bytes = 256 bits).
pub const KEY_LEN: usize = 32;

/// PBKDF2 rounds. One round only adapts the master secret to a fixed key length;
/// the secret is operator-provisioned and not a password.
const PBKDF2_ROUNDS: u32 = 1;

/// Records written before this service existed used an empty salt.
const PBKDF2_SALT: &[u8] = b"";

/// Fixed-size key buffer that holds exactly [`KEY_LEN`] bytes.
///
/// Computed once at startup and shared behind an `Arc`; it is never mutated
/// afterwards. The bytes are zeroed when the last owner drops it.
pub struct DerivedKey(Box<[u8; KEY_LEN]>);

impl DerivedKey {
    /// PBKDF2-HMAC-SHA256 of `master_secret`, empty salt, one round, 32 bytes out.
    pub fn derive(master_secret: &[u8]) -> Self {
        let mut key = Box::new([0u8; KEY_LEN]);
        pbkdf2_hmac::<Sha256>(master_secret, PBKDF2_SALT, PBKDF2_ROUNDS, &mut key[..]);
        Self(key)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl Drop for DerivedKey {
    fn drop(&mut self) {
        self.0.iter_mut().for_each(|b| *b = 0);
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedKey([REDACTED])")
    }
}
