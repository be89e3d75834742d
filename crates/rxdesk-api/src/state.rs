//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.
//!
//! ## Architecture
//!
//! Every table lives in memory and is seeded from a [`Dataset`] at startup:
//! - **Drugs**, **pharmacies**, **prescriptions**, **audit logs**: one
//!   [`Store`] each, keyed by identifier.
//! - **Accounts**: users, sessions, and captchas.
//! - **Inventory lock**: serializes every write that reads stock and then
//!   changes it (fulfillment and drug catalog edits), so two fulfillments
//!   cannot both dispense the same units.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard, RwLock};
use rxdesk_core::drug::DEFAULT_LOW_STOCK_THRESHOLD;
use rxdesk_core::{
    AuditLog, AuditLogId, Clock, Dataset, Drug, DrugId, Pharmacy, PharmacyId, Prescription,
    PrescriptionId, RxError, SystemClock,
};
use thiserror::Error;

use crate::accounts::Accounts;
use crate::middleware::metrics::ApiMetrics;
use crate::middleware::rate_limit::RateLimitConfig;

// -- Generic In-Memory Store --------------------------------------------------

/// Thread-safe, cloneable in-memory key-value store.
///
/// The lock is `parking_lot` and is never held across `.await` points.
/// Iteration follows key order.
#[derive(Debug)]
pub struct Store<K: Ord + Clone, V: Clone> {
    data: Arc<RwLock<BTreeMap<K, V>>>,
}

impl<K: Ord + Clone, V: Clone> Clone for Store<K, V> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<K: Ord + Clone, V: Clone> Store<K, V> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Build a store from `(key, value)` pairs.
    pub fn from_entries(entries: impl IntoIterator<Item = (K, V)>) -> Self {
        Self {
            data: Arc::new(RwLock::new(entries.into_iter().collect())),
        }
    }

    /// Insert a record, returning the previous value if the key existed.
    pub fn insert(&self, id: K, value: V) -> Option<V> {
        self.data.write().insert(id, value)
    }

    /// Retrieve a record by ID.
    pub fn get(&self, id: &K) -> Option<V> {
        self.data.read().get(id).cloned()
    }

    /// List all records in key order.
    pub fn list(&self) -> Vec<V> {
        self.data.read().values().cloned().collect()
    }

    /// Run `f` against the whole table under the read lock.
    pub fn read<R>(&self, f: impl FnOnce(&BTreeMap<K, V>) -> R) -> R {
        let guard = self.data.read();
        f(&*guard)
    }

    /// Run `f` against the whole table under the write lock.
    pub fn write<R>(&self, f: impl FnOnce(&mut BTreeMap<K, V>) -> R) -> R {
        let mut guard = self.data.write();
        f(&mut *guard)
    }

    /// Update a record in place. Returns the updated record, or `None` if not found.
    pub fn update(&self, id: &K, f: impl FnOnce(&mut V)) -> Option<V> {
        let mut guard = self.data.write();
        let entry = guard.get_mut(id)?;
        f(entry);
        Some(entry.clone())
    }

    /// Atomically read-validate-update a record.
    ///
    /// Returns `None` if the record doesn't exist, or `Some(result)` with
    /// the closure's `Result`.
    pub fn try_update<R, E>(
        &self,
        id: &K,
        f: impl FnOnce(&mut V) -> Result<R, E>,
    ) -> Option<Result<R, E>> {
        self.data.write().get_mut(id).map(f)
    }

    /// Remove a record by ID.
    pub fn remove(&self, id: &K) -> Option<V> {
        self.data.write().remove(id)
    }

    /// Check if a record exists.
    pub fn contains(&self, id: &K) -> bool {
        self.data.read().contains_key(id)
    }

    /// Return the number of records.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Ord + Clone, V: Clone> Default for Store<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

// -- Configuration ------------------------------------------------------------

/// Error reading configuration from the environment.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed.
    #[error("invalid value for {name}: {value:?} ({reason})")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },

    /// The seed dataset could not be loaded.
    #[error("failed to load seed dataset {path}: {source}")]
    Seed {
        path: PathBuf,
        #[source]
        source: RxError,
    },
}

/// Application configuration.
///
/// Custom `Debug` redacts the auth token.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Static operator bearer token. Requests presenting it act as admin.
    pub auth_token: Option<String>,
    /// Reject requests that carry no bearer token.
    pub require_auth: bool,
    /// Stock below this count is reported as low on the dashboard and in alerts.
    pub low_stock_threshold: u32,
    /// Dataset file to seed from; the bundled demo data when `None`.
    pub seed_path: Option<PathBuf>,
    /// Per-client limit on the captcha, login and registration routes.
    pub auth_rate_limit: RateLimitConfig,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field(
                "auth_token",
                &self.auth_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("require_auth", &self.require_auth)
            .field("low_stock_threshold", &self.low_stock_threshold)
            .field("seed_path", &self.seed_path)
            .field("auth_rate_limit", &self.auth_rate_limit)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            auth_token: None,
            require_auth: false,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            seed_path: None,
            auth_rate_limit: RateLimitConfig::default(),
        }
    }
}

fn parse_env<T: std::str::FromStr>(
    name: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match raw.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        None => Ok(default),
        Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
            value,
        }),
    }
}

impl AppConfig {
    /// Read configuration from the process environment.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `PORT` | `8080` |
    /// | `AUTH_TOKEN` | unset |
    /// | `RXDESK_REQUIRE_AUTH` | `true` |
    /// | `RXDESK_LOW_STOCK_THRESHOLD` | `20` |
    /// | `RXDESK_SEED` | bundled demo data |
    /// | `RXDESK_AUTH_RATE_LIMIT` | `60` account requests per client per minute, `0` disables |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            port: parse_env("PORT", lookup("PORT"), 8080)?,
            auth_token: lookup("AUTH_TOKEN").filter(|t| !t.trim().is_empty()),
            require_auth: parse_env("RXDESK_REQUIRE_AUTH", lookup("RXDESK_REQUIRE_AUTH"), true)?,
            low_stock_threshold: parse_env(
                "RXDESK_LOW_STOCK_THRESHOLD",
                lookup("RXDESK_LOW_STOCK_THRESHOLD"),
                DEFAULT_LOW_STOCK_THRESHOLD,
            )?,
            seed_path: lookup("RXDESK_SEED")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            auth_rate_limit: RateLimitConfig {
                max_requests: parse_env(
                    "RXDESK_AUTH_RATE_LIMIT",
                    lookup("RXDESK_AUTH_RATE_LIMIT"),
                    RateLimitConfig::default().max_requests,
                )?,
                ..RateLimitConfig::default()
            },
        })
    }

    /// Load the configured seed dataset.
    pub fn load_dataset(&self) -> Result<Dataset, ConfigError> {
        match &self.seed_path {
            Some(path) => Dataset::load(path).map_err(|source| ConfigError::Seed {
                path: path.clone(),
                source,
            }),
            None => Dataset::demo().map_err(|source| ConfigError::Seed {
                path: PathBuf::from("<bundled demo>"),
                source,
            }),
        }
    }
}

// -- AppState -----------------------------------------------------------------

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub drugs: Store<DrugId, Drug>,
    pub pharmacies: Store<PharmacyId, Pharmacy>,
    pub prescriptions: Store<PrescriptionId, Prescription>,
    pub audit_logs: Store<AuditLogId, AuditLog>,
    pub accounts: Accounts,
    pub clock: Arc<dyn Clock>,
    pub metrics: ApiMetrics,
    pub config: AppConfig,
    inventory: Arc<Mutex<()>>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("drugs", &self.drugs.len())
            .field("pharmacies", &self.pharmacies.len())
            .field("prescriptions", &self.prescriptions.len())
            .field("audit_logs", &self.audit_logs.len())
            .field("accounts", &self.accounts)
            .field("config", &self.config)
            .finish()
    }
}

impl AppState {
    /// Build state from a dataset, using the system clock.
    pub fn from_dataset(config: AppConfig, dataset: Dataset) -> Self {
        Self::with_clock(config, dataset, Arc::new(SystemClock))
    }

    /// Build state from a dataset with an explicit clock.
    pub fn with_clock(config: AppConfig, dataset: Dataset, clock: Arc<dyn Clock>) -> Self {
        let Dataset {
            drugs,
            pharmacies,
            prescriptions,
            audit_logs,
        } = dataset;
        Self {
            drugs: Store::from_entries(drugs.into_iter().map(|d| (d.id.clone(), d))),
            pharmacies: Store::from_entries(pharmacies.into_iter().map(|p| (p.id.clone(), p))),
            prescriptions: Store::from_entries(
                prescriptions.into_iter().map(|p| (p.id.clone(), p)),
            ),
            audit_logs: Store::from_entries(audit_logs.into_iter().map(|a| (a.id.clone(), a))),
            accounts: Accounts::with_default_admin(Arc::clone(&clock)),
            clock,
            metrics: ApiMetrics::new(),
            config,
            inventory: Arc::new(Mutex::new(())),
        }
    }

    /// Take the inventory lock. Hold the guard for the whole read-check-write
    /// sequence of a stock-changing operation.
    pub fn lock_inventory(&self) -> MutexGuard<'_, ()> {
        self.inventory.lock()
    }

    /// Snapshot every table back into a dataset.
    pub fn to_dataset(&self) -> Dataset {
        Dataset {
            drugs: self.drugs.list(),
            pharmacies: self.pharmacies.list(),
            prescriptions: self.prescriptions.list(),
            audit_logs: self.audit_logs.list(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    // -- Store tests ----------------------------------------------------------

    #[test]
    fn store_lists_in_key_order() {
        let store = Store::new();
        store.insert("b".to_string(), 2);
        store.insert("a".to_string(), 1);
        store.insert("c".to_string(), 3);
        assert_eq!(store.list(), vec![1, 2, 3]);
    }

    #[test]
    fn store_insert_returns_previous_value() {
        let store = Store::new();
        assert!(store.insert(1u32, "x").is_none());
        assert_eq!(store.insert(1u32, "y"), Some("x"));
        assert_eq!(store.get(&1), Some("y"));
    }

    #[test]
    fn store_update_and_remove() {
        let store = Store::from_entries([(1u32, 10u32)]);
        assert_eq!(store.update(&1, |v| *v += 5), Some(15));
        assert!(store.update(&2, |v| *v += 5).is_none());
        assert_eq!(store.remove(&1), Some(15));
        assert!(store.is_empty());
        assert!(!store.contains(&1));
    }

    #[test]
    fn store_try_update_runs_under_one_lock() {
        let store = Store::from_entries([(1u32, 3u32)]);
        let res: Option<Result<u32, &str>> = store.try_update(&1, |v| {
            if *v < 5 {
                return Err("too small");
            }
            *v -= 5;
            Ok(*v)
        });
        assert_eq!(res, Some(Err("too small")));
        assert_eq!(store.get(&1), Some(3));
        assert!(store.try_update(&9, |_| Ok::<_, ()>(())).is_none());
    }

    #[test]
    fn store_clone_shares_underlying_data() {
        let store = Store::new();
        let clone = store.clone();
        clone.insert(1u32, ());
        assert_eq!(store.len(), 1);
    }

    // -- Config tests ---------------------------------------------------------

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn config_defaults_require_auth() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 8080);
        assert!(config.require_auth);
        assert!(config.auth_token.is_none());
        assert_eq!(config.low_stock_threshold, 20);
        assert!(config.seed_path.is_none());
        assert_eq!(config.auth_rate_limit.max_requests, 60);
    }

    #[test]
    fn config_reads_variables() {
        let config = AppConfig::from_lookup(lookup(&[
            ("PORT", "3000"),
            ("AUTH_TOKEN", "tok"),
            ("RXDESK_REQUIRE_AUTH", "false"),
            ("RXDESK_LOW_STOCK_THRESHOLD", "50"),
            ("RXDESK_SEED", "/tmp/data.yaml"),
            ("RXDESK_AUTH_RATE_LIMIT", "5"),
        ]))
        .unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.auth_token.as_deref(), Some("tok"));
        assert!(!config.require_auth);
        assert_eq!(config.low_stock_threshold, 50);
        assert_eq!(config.seed_path, Some(PathBuf::from("/tmp/data.yaml")));
        assert_eq!(config.auth_rate_limit.max_requests, 5);
        assert_eq!(config.auth_rate_limit.window_secs, 60);
    }

    #[test]
    fn config_rejects_bad_port() {
        let err = AppConfig::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("PORT"), "{err}");
    }

    #[test]
    fn config_debug_redacts_token() {
        let config = AppConfig {
            auth_token: Some("secret-token".into()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn missing_seed_file_is_reported() {
        let config = AppConfig {
            seed_path: Some(PathBuf::from("/nonexistent/rxdesk.json")),
            ..AppConfig::default()
        };
        assert!(matches!(
            config.load_dataset(),
            Err(ConfigError::Seed { .. })
        ));
    }

    // -- AppState tests -------------------------------------------------------

    #[test]
    fn state_from_demo_dataset() {
        let state = AppState::from_dataset(AppConfig::default(), Dataset::demo().unwrap());
        assert_eq!(state.drugs.len(), 4);
        assert_eq!(state.pharmacies.len(), 2);
        assert_eq!(state.prescriptions.len(), 3);
        assert_eq!(state.audit_logs.len(), 2);
        assert_eq!(state.accounts.len(), 1);
        assert_eq!(state.to_dataset(), Dataset::demo().unwrap());
    }
}
