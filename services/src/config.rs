use serde::Deserialize;
use std::env::vars;
use std::fmt::Display;
use std::time::Duration;
use tracing::info;

const DEFAULT_LOCAL_DATABASE_URL: &str = "sqlite://blog.db?mode=rwc";
const DEFAULT_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Deployment environment, read from `ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Env {
    Local,
    Prod,
    Test,
}

impl Env {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Prod => "prod",
            Self::Test => "test",
        }
    }
}

impl Display for Env {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated store settings.
#[derive(Debug, Clone)]
pub struct Config {
    env: Env,
    database_url: String,
    max_connections: u32,
    busy_timeout: Duration,
}

// Raw environment values before defaults are applied.
#[derive(Deserialize)]
struct RawConfig {
    env: Option<Env>,
    database_url: Option<String>,
    db_max_connections: Option<u32>,
    db_busy_timeout_ms: Option<u64>,
}

impl Config {
    /// Create a test configuration backed by an in-memory database.
    ///
    /// Available to unit and integration tests; not meant for production.
    pub fn new_for_test() -> Self {
        Self {
            env: Env::Test,
            database_url: "sqlite::memory:".to_owned(),
            max_connections: 1,
            busy_timeout: Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS),
        }
    }

    /// Create a test configuration pointing at a specific database URL.
    pub fn new_for_test_with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            ..Self::new_for_test()
        }
    }

    /// Points the configuration at another database, e.g. from a CLI flag.
    pub fn with_database_url(mut self, database_url: impl Into<String>) -> Self {
        self.database_url = database_url.into();
        self
    }

    pub fn environment(&self) -> Env {
        self.env
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    /// Pool size. An in-memory database lives inside one connection, so it
    /// is always served by exactly one.
    pub fn max_connections(&self) -> u32 {
        if self.is_in_memory() {
            1
        } else {
            self.max_connections
        }
    }

    pub fn busy_timeout(&self) -> Duration {
        self.busy_timeout
    }

    pub fn is_local(&self) -> bool {
        self.env == Env::Local
    }

    pub fn is_prod(&self) -> bool {
        self.env == Env::Prod
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_url.contains(":memory:") || self.database_url.contains("mode=memory")
    }

    /// Reads `ENV`, `DATABASE_URL`, `DB_MAX_CONNECTIONS` and
    /// `DB_BUSY_TIMEOUT_MS`, filling in per-environment defaults.
    ///
    /// Nothing is logged here since callers usually read the configuration
    /// before installing a subscriber; call [`Config::log_loaded`] afterwards.
    pub fn init() -> anyhow::Result<Self> {
        let raw: RawConfig = serde_env::from_iter(vars())?;
        Self::from_raw(raw)
    }

    /// Logs the effective settings, defaults included.
    pub fn log_loaded(&self) {
        info!(
            env = %self.env,
            database_url = %self.database_url,
            max_connections = self.max_connections(),
            busy_timeout_ms = self.busy_timeout.as_millis(),
            "Configuration loaded"
        );
    }

    fn from_raw(raw: RawConfig) -> anyhow::Result<Self> {
        let RawConfig {
            env,
            database_url,
            db_max_connections,
            db_busy_timeout_ms,
        } = raw;

        let env = env.unwrap_or(Env::Local);

        let database_url = match database_url {
            Some(url) => url,
            None if matches!(env, Env::Local | Env::Test) => DEFAULT_LOCAL_DATABASE_URL.to_owned(),
            None => anyhow::bail!("DATABASE_URL must be set for {env} environment"),
        };

        let max_connections = db_max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS);
        if max_connections == 0 {
            anyhow::bail!("DB_MAX_CONNECTIONS must be at least 1");
        }

        let busy_timeout =
            Duration::from_millis(db_busy_timeout_ms.unwrap_or(DEFAULT_BUSY_TIMEOUT_MS));

        Ok(Self {
            env,
            database_url,
            max_connections,
            busy_timeout,
        })
    }
}
