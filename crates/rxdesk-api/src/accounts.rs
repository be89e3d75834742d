//! # Back-Office Accounts
//!
//! In-memory user accounts, login sessions and single-use captchas.
//!
//! Passwords are stored as `hex(salt) $ hex(sha256(salt || password))`
//! with a fresh 16-byte salt per account. Session tokens and captcha ids
//! are random and held only in memory, so a restart logs everyone out.
//! Sessions last [`SESSION_TTL_HOURS`]; expired sessions and captchas are
//! pruned whenever a new one is issued.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use rand_core::{OsRng, RngCore};
use rxdesk_core::{Clock, UserId, ValidationError};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::Role;

/// Username of the account created at startup.
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";
/// Password of the account created at startup.
pub const DEFAULT_ADMIN_PASSWORD: &str = "123456";

const MIN_USERNAME_LEN: usize = 3;
const MIN_PASSWORD_LEN: usize = 6;
const CAPTCHA_LEN: usize = 4;
const CAPTCHA_TTL_MINUTES: i64 = 5;
/// Outstanding captchas kept at once; issuing past this evicts the oldest.
const MAX_OUTSTANDING_CAPTCHAS: usize = 10_000;
/// Lifetime of a login session.
pub const SESSION_TTL_HOURS: i64 = 12;
// No 0/O or 1/I/L.
const CAPTCHA_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

/// Account operation failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccountError {
    /// Unknown username or wrong password.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// Captcha missing, expired, already used, or wrong.
    #[error("invalid captcha")]
    CaptchaMismatch,

    /// Registration form failed validation.
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    /// Username is taken.
    #[error("username {0} is already registered")]
    DuplicateUsername(String),

    /// Email is taken.
    #[error("email {0} is already registered")]
    DuplicateEmail(String),

    /// Every user id is taken.
    #[error("no user ids left to issue")]
    IdsExhausted,
}

/// Public view of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Registration form.
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl Registration {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.username.trim().chars().count() < MIN_USERNAME_LEN {
            return Err(ValidationError::FieldTooShort {
                field: "username",
                min: MIN_USERNAME_LEN,
            });
        }
        let email = self.email.trim();
        let well_formed = email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());
        if !well_formed {
            return Err(ValidationError::InvalidEmail(self.email.clone()));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::FieldTooShort {
                field: "password",
                min: MIN_PASSWORD_LEN,
            });
        }
        if self.password != self.confirm_password {
            return Err(ValidationError::PasswordMismatch);
        }
        Ok(())
    }
}

struct StoredUser {
    user: User,
    password_hash: String,
}

struct Captcha {
    code: String,
    expires_at: DateTime<Utc>,
}

struct LoginSession {
    // Lowercase username.
    user_key: String,
    expires_at: DateTime<Utc>,
}

#[derive(Default)]
struct Inner {
    // Keyed by lowercase username.
    users: BTreeMap<String, StoredUser>,
    sessions: HashMap<String, LoginSession>,
    captchas: HashMap<String, Captcha>,
}

/// Shared account registry. Cloning shares the underlying data.
#[derive(Clone)]
pub struct Accounts {
    inner: Arc<RwLock<Inner>>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for Accounts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("Accounts")
            .field("users", &inner.users.len())
            .field("sessions", &inner.sessions.len())
            .field("captchas", &inner.captchas.len())
            .finish()
    }
}

impl Accounts {
    /// An empty registry.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
            clock,
        }
    }

    /// A registry holding the default administrator account.
    pub fn with_default_admin(clock: Arc<dyn Clock>) -> Self {
        let accounts = Self::new(clock);
        {
            let mut inner = accounts.inner.write();
            accounts.insert_user(
                &mut inner,
                UserId::sequential(1),
                DEFAULT_ADMIN_USERNAME,
                "admin@rxdesk.local",
                DEFAULT_ADMIN_PASSWORD,
                Role::Admin,
            );
        }
        accounts
    }

    fn insert_user(
        &self,
        inner: &mut Inner,
        id: UserId,
        username: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> User {
        let user = User {
            id,
            username: username.trim().to_string(),
            email: email.trim().to_string(),
            role,
            created_at: self.clock.now(),
        };
        inner.users.insert(
            user.username.to_lowercase(),
            StoredUser {
                user: user.clone(),
                password_hash: hash_password(password),
            },
        );
        user
    }

    /// Issue a captcha, returning `(captcha_id, code)`.
    pub fn issue_captcha(&self) -> (String, String) {
        let now = self.clock.now();
        let id = Uuid::new_v4().to_string();
        let code = random_code(CAPTCHA_LEN);
        let mut inner = self.inner.write();
        inner.captchas.retain(|_, c| c.expires_at > now);
        if inner.captchas.len() >= MAX_OUTSTANDING_CAPTCHAS {
            let oldest = inner
                .captchas
                .iter()
                .min_by_key(|(_, c)| c.expires_at)
                .map(|(id, _)| id.clone());
            if let Some(oldest) = oldest {
                inner.captchas.remove(&oldest);
            }
        }
        inner.captchas.insert(
            id.clone(),
            Captcha {
                code: code.clone(),
                expires_at: now + Duration::minutes(CAPTCHA_TTL_MINUTES),
            },
        );
        (id, code)
    }

    /// Check and consume a captcha. A captcha is spent by any attempt,
    /// right or wrong.
    pub fn verify_captcha(&self, captcha_id: &str, code: &str) -> Result<(), AccountError> {
        let now = self.clock.now();
        let issued = self.inner.write().captchas.remove(captcha_id);
        match issued {
            Some(c) if c.expires_at > now && c.code.eq_ignore_ascii_case(code.trim()) => Ok(()),
            _ => Err(AccountError::CaptchaMismatch),
        }
    }

    /// Create a `user`-role account.
    pub fn register(&self, form: &Registration) -> Result<User, AccountError> {
        form.validate()?;
        let mut inner = self.inner.write();
        let username = form.username.trim();
        if inner.users.contains_key(&username.to_lowercase()) {
            return Err(AccountError::DuplicateUsername(username.to_string()));
        }
        let email = form.email.trim();
        if inner
            .users
            .values()
            .any(|s| s.user.email.eq_ignore_ascii_case(email))
        {
            return Err(AccountError::DuplicateEmail(email.to_string()));
        }
        let id = UserId::next_after(inner.users.values().map(|s| &s.user.id))
            .map_err(|_| AccountError::IdsExhausted)?;
        let user = self.insert_user(&mut inner, id, username, email, &form.password, Role::User);
        tracing::info!(username = %user.username, "account registered");
        Ok(user)
    }

    /// Verify credentials and open a session, returning the user and token.
    pub fn login(&self, username: &str, password: &str) -> Result<(User, String), AccountError> {
        let key = username.trim().to_lowercase();
        let mut inner = self.inner.write();
        let user = match inner.users.get(&key) {
            Some(stored) if verify_password(password, &stored.password_hash) => {
                stored.user.clone()
            }
            _ => {
                tracing::warn!(username = %username.trim(), "login rejected");
                return Err(AccountError::InvalidCredentials);
            }
        };
        let now = self.clock.now();
        inner.sessions.retain(|_, s| s.expires_at > now);
        let token = random_hex(32);
        inner.sessions.insert(
            token.clone(),
            LoginSession {
                user_key: key,
                expires_at: now + Duration::hours(SESSION_TTL_HOURS),
            },
        );
        tracing::info!(username = %user.username, "login");
        Ok((user, token))
    }

    /// Close a session. Returns whether the token was live.
    pub fn logout(&self, token: &str) -> bool {
        self.inner.write().sessions.remove(token).is_some()
    }

    /// The user behind a live session token.
    pub fn session_user(&self, token: &str) -> Option<User> {
        let now = self.clock.now();
        let inner = self.inner.read();
        let session = inner.sessions.get(token).filter(|s| s.expires_at > now)?;
        inner.users.get(&session.user_key).map(|s| s.user.clone())
    }

    /// Number of sessions held, expired ones included until pruned.
    pub fn session_count(&self) -> usize {
        self.inner.read().sessions.len()
    }

    /// Number of captchas awaiting use.
    pub fn captcha_count(&self) -> usize {
        self.inner.read().captchas.len()
    }

    /// Number of accounts.
    pub fn len(&self) -> usize {
        self.inner.read().users.len()
    }

    /// Whether there are no accounts.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn random_hex(len: usize) -> String {
    let mut buf = vec![0u8; len];
    OsRng.fill_bytes(&mut buf);
    hex(&buf)
}

fn random_code(len: usize) -> String {
    (0..len)
        .map(|_| {
            let idx = OsRng.next_u32() as usize % CAPTCHA_ALPHABET.len();
            char::from(CAPTCHA_ALPHABET[idx])
        })
        .collect()
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex(&hasher.finalize())
}

fn hash_password(password: &str) -> String {
    let salt = random_hex(16);
    let hash = digest(&salt, password);
    format!("{salt}${hash}")
}

fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt, expected)) = stored.split_once('$') else {
        return false;
    };
    digest(salt, password)
        .as_bytes()
        .ct_eq(expected.as_bytes())
        .into()
}
