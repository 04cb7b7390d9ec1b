//! Session cookie policy loaded from the environment.
//!
//! Every `/api/v1` route rides on an encrypted session cookie, so the whole
//! cookie policy is deployment configuration rather than code: operators set
//! the `SESSION_*` variables and mount the signing key as a secret file.
//!
//! Two tiers of strictness apply. The cookie attributes
//! (`SESSION_COOKIE_NAME`, `SESSION_COOKIE_PATH`, `SESSION_TTL_SECONDS`)
//! carry documented defaults and may be omitted in any build. The
//! security-sensitive values (`SESSION_COOKIE_SECURE`, `SESSION_SAMESITE`,
//! `SESSION_ALLOW_EPHEMERAL`, and the key file) must be present and valid in
//! release builds, while debug builds log a warning and substitute
//! development defaults so a fresh checkout starts unaided.

pub mod fingerprint;

use std::io;
use std::path::PathBuf;

use actix_web::cookie::time::Duration;
use actix_web::cookie::{Key, SameSite};
use mockable::Env;
use thiserror::Error;
use tracing::warn;
use zeroize::Zeroize;

/// Overrides the session cookie name.
pub const COOKIE_NAME_ENV: &str = "SESSION_COOKIE_NAME";
/// Overrides the session cookie path attribute.
pub const COOKIE_PATH_ENV: &str = "SESSION_COOKIE_PATH";
/// Controls the cookie `Secure` attribute.
pub const COOKIE_SECURE_ENV: &str = "SESSION_COOKIE_SECURE";
/// Selects the cookie `SameSite` mode.
pub const SAMESITE_ENV: &str = "SESSION_SAMESITE";
/// Overrides the idle session lifetime, in seconds.
pub const TTL_ENV: &str = "SESSION_TTL_SECONDS";
/// Permits a generated throwaway signing key.
pub const ALLOW_EPHEMERAL_ENV: &str = "SESSION_ALLOW_EPHEMERAL";
/// Points at the signing key file.
pub const KEY_FILE_ENV: &str = "SESSION_KEY_FILE";

/// Cookie name used when [`COOKIE_NAME_ENV`] is unset.
pub const DEFAULT_COOKIE_NAME: &str = "session";
/// Cookie path used when [`COOKIE_PATH_ENV`] is unset.
pub const DEFAULT_COOKIE_PATH: &str = "/";
/// Idle lifetime used when [`TTL_ENV`] is unset: two hours.
pub const DEFAULT_TTL_SECONDS: i64 = 7_200;
/// Key file consulted when [`KEY_FILE_ENV`] is unset.
pub const DEFAULT_KEY_PATH: &str = "/var/run/secrets/session_key";
/// Shortest signing key the server accepts, in bytes.
pub const SESSION_KEY_MIN_LEN: usize = 64;

const BOOL_EXPECTED: &str = "1|0|true|false|yes|no|y|n";
const SAMESITE_EXPECTED: &str = "Strict|Lax|None";
const TTL_EXPECTED: &str = "a positive number of seconds";
const COOKIE_NAME_EXPECTED: &str = "a cookie token without separators";
const COOKIE_PATH_EXPECTED: &str = "an absolute path";

/// Strictness tier the policy is read under.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildMode {
    /// Development startup: warn on bad values and substitute defaults.
    Debug,
    /// Production startup: refuse to run on missing or malformed values.
    Release,
}

impl BuildMode {
    /// Select the tier the binary was compiled for.
    #[must_use]
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }

    fn forgiving(self) -> bool {
        self == Self::Debug
    }
}

/// Validated cookie policy, ready to hand to the session middleware.
#[derive(Clone)]
pub struct SessionSettings {
    /// Cookie signing and encryption key.
    pub key: Key,
    /// Name of the session cookie.
    pub cookie_name: String,
    /// Path attribute of the session cookie.
    pub cookie_path: String,
    /// Whether the cookie carries the `Secure` attribute.
    pub cookie_secure: bool,
    /// `SameSite` attribute of the cookie.
    pub same_site: SameSite,
    /// How long an idle session stays valid.
    pub ttl: Duration,
}

/// Reasons the session policy could not be assembled.
#[derive(Debug, Error)]
pub enum SessionConfigError {
    #[error("{name} must be set in release builds")]
    Missing { name: &'static str },
    #[error("{name}={value:?} is not usable, expected {expected}")]
    Invalid {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("session key at {path} could not be read")]
    KeyUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(
        "session key at {path} is {length} bytes, at least {SESSION_KEY_MIN_LEN} are required"
    )]
    KeyTooShort { path: PathBuf, length: usize },
    #[error("SameSite=None requires the Secure cookie attribute")]
    SameSiteNoneInsecure,
    #[error("ephemeral session keys are not permitted in release builds")]
    EphemeralForbidden,
}

impl SessionSettings {
    /// Assemble the session policy from `SESSION_*` environment variables.
    ///
    /// # Examples
    /// ```
    /// use actix_web::cookie::SameSite;
    /// use backend::inbound::http::session_config::{BuildMode, SessionSettings};
    /// use mockable::MockEnv;
    ///
    /// let mut env = MockEnv::new();
    /// env.expect_string().returning(|_| None);
    ///
    /// let settings = SessionSettings::from_env(&env, BuildMode::Debug)
    ///     .expect("debug mode settles on defaults");
    /// assert_eq!(settings.cookie_name, "session");
    /// assert_eq!(settings.same_site, SameSite::Lax);
    /// ```
    ///
    /// # Errors
    /// Returns [`SessionConfigError`] when a variable is missing or
    /// malformed in release mode, when `SameSite=None` is combined with an
    /// insecure cookie, when an ephemeral key is requested in release mode,
    /// or when the key file is unreadable or too short.
    pub fn from_env<E: Env>(env: &E, mode: BuildMode) -> Result<Self, SessionConfigError> {
        let reader = PolicyReader { env, mode };

        let cookie_name = reader.optional(
            COOKIE_NAME_ENV,
            COOKIE_NAME_EXPECTED,
            DEFAULT_COOKIE_NAME.to_owned(),
            parse_cookie_name,
        )?;
        let cookie_path = reader.optional(
            COOKIE_PATH_ENV,
            COOKIE_PATH_EXPECTED,
            DEFAULT_COOKIE_PATH.to_owned(),
            parse_cookie_path,
        )?;
        let ttl = reader.optional(
            TTL_ENV,
            TTL_EXPECTED,
            Duration::seconds(DEFAULT_TTL_SECONDS),
            parse_ttl,
        )?;
        let cookie_secure = reader.required(COOKIE_SECURE_ENV, BOOL_EXPECTED, true, parse_bool)?;
        let same_site = reader.same_site(cookie_secure)?;
        let allow_ephemeral = reader.allow_ephemeral()?;
        let key = reader.load_key(allow_ephemeral)?;

        Ok(Self {
            key,
            cookie_name,
            cookie_path,
            cookie_secure,
            same_site,
            ttl,
        })
    }
}

struct PolicyReader<'e, E: Env> {
    env: &'e E,
    mode: BuildMode,
}

impl<E: Env> PolicyReader<'_, E> {
    /// Variable with a documented default: absence is fine in both modes,
    /// garbage is fatal only in release.
    fn optional<T>(
        &self,
        name: &'static str,
        expected: &'static str,
        default: T,
        parse: impl Fn(&str) -> Option<T>,
    ) -> Result<T, SessionConfigError> {
        match self.env.string(name) {
            Some(raw) => self.parsed(name, expected, raw, default, parse),
            None => Ok(default),
        }
    }

    /// Security-sensitive variable: release builds require it to be present
    /// and valid, debug builds fall back to `debug_default`.
    fn required<T>(
        &self,
        name: &'static str,
        expected: &'static str,
        debug_default: T,
        parse: impl Fn(&str) -> Option<T>,
    ) -> Result<T, SessionConfigError> {
        match self.env.string(name) {
            Some(raw) => self.parsed(name, expected, raw, debug_default, parse),
            None if self.mode.forgiving() => Ok(debug_default),
            None => Err(SessionConfigError::Missing { name }),
        }
    }

    fn parsed<T>(
        &self,
        name: &'static str,
        expected: &'static str,
        raw: String,
        fallback: T,
        parse: impl Fn(&str) -> Option<T>,
    ) -> Result<T, SessionConfigError> {
        match parse(raw.trim()) {
            Some(value) => Ok(value),
            None if self.mode.forgiving() => {
                warn!(variable = name, value = %raw, "ignoring invalid session setting");
                Ok(fallback)
            }
            None => Err(SessionConfigError::Invalid {
                name,
                value: raw,
                expected,
            }),
        }
    }

    fn same_site(&self, cookie_secure: bool) -> Result<SameSite, SessionConfigError> {
        let value = self.required(SAMESITE_ENV, SAMESITE_EXPECTED, SameSite::Lax, parse_same_site)?;
        if value == SameSite::None && !cookie_secure {
            if !self.mode.forgiving() {
                return Err(SessionConfigError::SameSiteNoneInsecure);
            }
            warn!("SameSite=None without the Secure attribute, using Lax");
            return Ok(SameSite::Lax);
        }
        Ok(value)
    }

    fn allow_ephemeral(&self) -> Result<bool, SessionConfigError> {
        let value = self.required(ALLOW_EPHEMERAL_ENV, BOOL_EXPECTED, true, parse_bool)?;
        if value && !self.mode.forgiving() {
            return Err(SessionConfigError::EphemeralForbidden);
        }
        Ok(value)
    }

    fn load_key(&self, allow_ephemeral: bool) -> Result<Key, SessionConfigError> {
        let path = PathBuf::from(
            self.env
                .string(KEY_FILE_ENV)
                .unwrap_or_else(|| DEFAULT_KEY_PATH.to_owned()),
        );
        match std::fs::read(&path) {
            Ok(mut bytes) => {
                let length = bytes.len();
                if length >= SESSION_KEY_MIN_LEN {
                    let key = Key::derive_from(&bytes);
                    bytes.zeroize();
                    return Ok(key);
                }
                bytes.zeroize();
                if allow_ephemeral {
                    warn!(
                        path = %path.display(),
                        length,
                        "session key too short, generating an ephemeral key"
                    );
                    Ok(Key::generate())
                } else {
                    Err(SessionConfigError::KeyTooShort { path, length })
                }
            }
            Err(source) if allow_ephemeral => {
                warn!(
                    path = %path.display(),
                    error = %source,
                    "session key unreadable, generating an ephemeral key"
                );
                Ok(Key::generate())
            }
            Err(source) => Err(SessionConfigError::KeyUnreadable { path, source }),
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}

fn parse_same_site(raw: &str) -> Option<SameSite> {
    match raw.to_ascii_lowercase().as_str() {
        "strict" => Some(SameSite::Strict),
        "lax" => Some(SameSite::Lax),
        "none" => Some(SameSite::None),
        _ => None,
    }
}

fn parse_cookie_name(raw: &str) -> Option<String> {
    let valid = !raw.is_empty()
        && raw
            .bytes()
            .all(|b| b.is_ascii_graphic() && !matches!(b, b'=' | b';' | b',' | b'"'));
    valid.then(|| raw.to_owned())
}

fn parse_cookie_path(raw: &str) -> Option<String> {
    (raw.starts_with('/') && !raw.contains(';')).then(|| raw.to_owned())
}

fn parse_ttl(raw: &str) -> Option<Duration> {
    raw.parse::<i64>()
        .ok()
        .filter(|secs| *secs > 0)
        .map(Duration::seconds)
}
