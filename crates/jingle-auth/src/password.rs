/// Password hashing and verification using PBKDF2-HMAC-SHA1
///
/// Parameters are fixed so that hashes stored by earlier releases keep
/// verifying:
/// - Algorithm: PBKDF2 with HMAC-SHA1
/// - Iterations: 65536
/// - Salt: 20 bytes, derived from the password (legacy) or random
/// - Output: 16 bytes
///
/// Two stored layouts exist. A legacy credential is the bare 16-byte key;
/// its salt is rebuilt from the password on every check. A random-salt
/// credential is the 20-byte salt followed by the 16-byte key.
use crate::error::AuthError;
use jingle_core::SaltScheme;
use rand::{rngs::OsRng, RngCore};
use sha1::Sha1;
use subtle::ConstantTimeEq;

/// Shortest password accepted, counted in UTF-16 code units
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// PBKDF2 rounds per derivation
pub const PBKDF2_ITERATIONS: u32 = 65_536;

/// Salt length in bytes
pub const SALT_LEN: usize = 20;

/// Derived key length in bytes (128 bits)
pub const HASH_LEN: usize = 16;

/// A derived 128-bit password key
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PasswordHash([u8; HASH_LEN]);

impl PasswordHash {
    /// Raw key bytes
    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    /// Copy the key into an owned buffer for storage
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    /// Lower-case hex rendering of the key
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Compare against stored bytes without short-circuiting
    pub fn matches(&self, stored: &[u8]) -> bool {
        self.0.as_slice().ct_eq(stored).into()
    }
}

impl std::fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PasswordHash(..)")
    }
}

/// Password hasher bound to a salt scheme for newly stored credentials
#[derive(Debug, Clone, Copy, Default)]
pub struct PasswordHasher {
    scheme: SaltScheme,
}

impl PasswordHasher {
    /// Create a hasher that stores new credentials using `scheme`
    pub fn new(scheme: SaltScheme) -> Self {
        Self { scheme }
    }

    /// Derive the legacy hash of a password
    ///
    /// The salt is the password's own UTF-16 code units read backwards,
    /// cyclically, truncated to their low byte, for 20 bytes. The result is
    /// therefore a pure function of the password.
    ///
    /// # Returns
    ///
    /// * `Ok(PasswordHash)` - 16-byte derived key
    /// * `Err(AuthError::InvalidPassword)` - Password shorter than 8 characters
    ///
    /// # Example
    ///
    /// ```
    /// use jingle_auth::PasswordHasher;
    ///
    /// let a = PasswordHasher::derive("longenoughpw").unwrap();
    /// let b = PasswordHasher::derive("longenoughpw").unwrap();
    /// assert_eq!(a, b);
    /// assert!(PasswordHasher::derive("short").is_err());
    /// ```
    pub fn derive(password: &str) -> Result<PasswordHash, AuthError> {
        let units = checked_units(password)?;
        Ok(derive_key(password, &legacy_salt(&units)))
    }

    /// Produce the bytes to persist for a new or changed password
    ///
    /// * `SaltScheme::Legacy` - the 16-byte key from [`PasswordHasher::derive`]
    /// * `SaltScheme::Random` - 20 random salt bytes followed by the 16-byte key
    pub fn hash_for_storage(&self, password: &str) -> Result<Vec<u8>, AuthError> {
        match self.scheme {
            SaltScheme::Legacy => Self::derive(password).map(|hash| hash.to_vec()),
            SaltScheme::Random => {
                checked_units(password)?;

                let mut salt = [0u8; SALT_LEN];
                OsRng.fill_bytes(&mut salt);

                let mut stored = Vec::with_capacity(SALT_LEN + HASH_LEN);
                stored.extend_from_slice(&salt);
                stored.extend_from_slice(derive_key(password, &salt).as_bytes());
                Ok(stored)
            }
        }
    }

    /// Verify a plaintext password against stored credential bytes
    ///
    /// Both stored layouts are accepted whatever scheme this hasher uses.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - Password matches
    /// * `Ok(false)` - Password does not match, or the stored bytes have an
    ///   unknown layout
    /// * `Err(AuthError::InvalidPassword)` - Password shorter than 8 characters
    pub fn verify(&self, password: &str, stored: &[u8]) -> Result<bool, AuthError> {
        let units = checked_units(password)?;

        match stored.len() {
            HASH_LEN => Ok(derive_key(password, &legacy_salt(&units)).matches(stored)),
            len if len == SALT_LEN + HASH_LEN => {
                let (salt, key) = stored.split_at(SALT_LEN);
                Ok(derive_key(password, salt).matches(key))
            }
            len => {
                tracing::warn!(stored_len = len, "Stored password hash has an unknown layout");
                Ok(false)
            }
        }
    }
}

/// Hash a password with the legacy derived salt
///
/// Convenience wrapper around [`PasswordHasher::derive`].
pub fn hash_password(password: &str) -> Result<PasswordHash, AuthError> {
    PasswordHasher::derive(password)
}

/// Check the minimum length without hashing
pub fn validate_password_length(password: &str) -> Result<(), AuthError> {
    checked_units(password).map(|_| ())
}

fn checked_units(password: &str) -> Result<Vec<u16>, AuthError> {
    let units: Vec<u16> = password.encode_utf16().collect();
    if units.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::InvalidPassword);
    }
    Ok(units)
}

fn legacy_salt(units: &[u16]) -> [u8; SALT_LEN] {
    let len = units.len();
    let mut salt = [0u8; SALT_LEN];
    for (i, byte) in salt.iter_mut().enumerate() {
        // low byte only
        *byte = units[len - 1 - (i % len)] as u8;
    }
    salt
}

fn derive_key(password: &str, salt: &[u8]) -> PasswordHash {
    let mut key = [0u8; HASH_LEN];
    pbkdf2::pbkdf2_hmac::<Sha1>(password.as_bytes(), salt, PBKDF2_ITERATIONS, &mut key);
    PasswordHash(key)
}
