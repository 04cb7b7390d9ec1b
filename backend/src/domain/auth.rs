//! Authentication primitives: login credentials and stored passwords.
//!
//! Keep inbound payload parsing outside the domain by exposing constructors
//! that validate string inputs before a handler talks to a port or service.

use std::fmt;

use sha2::{Digest, Sha256};
use uuid::Uuid;
use zeroize::Zeroizing;

/// Domain error returned when login payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginValidationError {
    /// Username was missing or blank once trimmed.
    EmptyUsername,
    /// Password was blank.
    EmptyPassword,
}

impl fmt::Display for LoginValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyUsername => write!(f, "username must not be empty"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
        }
    }
}

impl std::error::Error for LoginValidationError {}

/// Validated login credentials used by authentication services.
///
/// ## Invariants
/// - `username` is trimmed and lower-cased; lookups are case-insensitive.
/// - `password` must be non-empty but retains caller-provided whitespace to
///   avoid surprising credential comparisons.
///
/// # Examples
/// ```
/// use backend::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts("MPerez", "secret").unwrap();
/// assert_eq!(creds.username(), "mperez");
/// assert_eq!(creds.password(), "secret");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    username: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw username/password inputs.
    pub fn try_from_parts(username: &str, password: &str) -> Result<Self, LoginValidationError> {
        let normalized = username.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(LoginValidationError::EmptyUsername);
        }

        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }

        Ok(Self {
            username: normalized,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Lowercase username suitable for directory lookups.
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Password string provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Salted password digest stored by the directory.
///
/// Encoded as `v1$<salt-hex>$<digest-hex>` where the digest is
/// SHA-256 over `salt || password`. The plaintext never leaves
/// [`LoginCredentials`].
///
/// `v1` is a single SHA-256 round, which is fast to brute-force offline;
/// it only suits the development-seeded directory. Production password
/// storage needs a memory-hard KDF such as argon2, registered as the next
/// encoding version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

/// Error returned when decoding a stored password hash.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("stored password hash is malformed")]
pub struct InvalidPasswordHash;

impl PasswordHash {
    /// Hash a plaintext password under a fresh random salt.
    pub fn derive(password: &str) -> Self {
        let salt = Uuid::new_v4();
        Self::derive_with_salt(password, salt.as_bytes())
    }

    fn derive_with_salt(password: &str, salt: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(salt);
        hasher.update(password.as_bytes());
        let digest = hasher.finalize();
        Self(format!("v1${}${}", hex::encode(salt), hex::encode(digest)))
    }

    /// Reconstruct a hash from its stored encoding.
    pub fn from_encoded(encoded: impl Into<String>) -> Result<Self, InvalidPasswordHash> {
        let encoded = encoded.into();
        let mut parts = encoded.split('$');
        let (version, salt, digest) = (parts.next(), parts.next(), parts.next());
        match (version, salt, digest, parts.next()) {
            (Some("v1"), Some(salt), Some(digest), None)
                if !salt.is_empty()
                    && !digest.is_empty()
                    && hex::decode(salt).is_ok()
                    && hex::decode(digest).is_ok() =>
            {
                Ok(Self(encoded))
            }
            _ => Err(InvalidPasswordHash),
        }
    }

    /// Check a plaintext password against this hash.
    #[must_use]
    pub fn verify(&self, password: &str) -> bool {
        let mut parts = self.0.split('$');
        let (Some("v1"), Some(salt_hex), Some(_)) = (parts.next(), parts.next(), parts.next())
        else {
            return false;
        };
        let Ok(salt) = hex::decode(salt_hex) else {
            return false;
        };
        Self::derive_with_salt(password, &salt).0 == self.0
    }

    /// Stored encoding.
    pub fn as_encoded(&self) -> &str {
        self.0.as_str()
    }
}

impl From<PasswordHash> for String {
    fn from(value: PasswordHash) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "pw", LoginValidationError::EmptyUsername)]
    #[case("   ", "pw", LoginValidationError::EmptyUsername)]
    #[case("user", "", LoginValidationError::EmptyPassword)]
    fn invalid_credentials(
        #[case] username: &str,
        #[case] password: &str,
        #[case] expected: LoginValidationError,
    ) {
        let err = LoginCredentials::try_from_parts(username, password)
            .expect_err("invalid inputs must fail");
        assert_eq!(err, expected);
    }

    #[rstest]
    #[case("  MPerez  ", "mperez", "secret")]
    #[case("Alice", "alice", "correct horse battery staple")]
    fn valid_credentials_normalise_username(
        #[case] username: &str,
        #[case] expected: &str,
        #[case] password: &str,
    ) {
        let creds = LoginCredentials::try_from_parts(username, password)
            .expect("valid inputs should succeed");
        assert_eq!(creds.username(), expected);
        assert_eq!(creds.password(), password);
    }

    #[rstest]
    fn derive_and_verify_round_trip() {
        let hash = PasswordHash::derive("hunter2");
        assert!(hash.verify("hunter2"));
        assert!(!hash.verify("hunter3"));
    }

    #[rstest]
    fn fresh_salts_produce_distinct_encodings() {
        let a = PasswordHash::derive("same-password");
        let b = PasswordHash::derive("same-password");
        assert_ne!(a.as_encoded(), b.as_encoded());
        assert!(a.verify("same-password"));
        assert!(b.verify("same-password"));
    }

    #[rstest]
    fn encoding_is_versioned_for_future_kdfs() {
        let hash = PasswordHash::derive("hunter2");
        assert!(hash.as_encoded().starts_with("v1$"));
    }

    #[rstest]
    fn encoded_round_trip_preserves_verification() {
        let hash = PasswordHash::derive("hunter2");
        let restored =
            PasswordHash::from_encoded(hash.as_encoded()).expect("well-formed encoding");
        assert!(restored.verify("hunter2"));
    }

    #[rstest]
    #[case("")]
    #[case("v0$aa$bb")]
    #[case("v1$$bb")]
    #[case("v1$zz$bb")]
    #[case("v1$aa$bb$cc")]
    #[case("plaintext")]
    fn from_encoded_rejects_malformed_input(#[case] encoded: &str) {
        assert_eq!(
            PasswordHash::from_encoded(encoded).expect_err("malformed"),
            InvalidPasswordHash
        );
    }
}
