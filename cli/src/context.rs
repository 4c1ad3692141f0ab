//! Store and identity setup shared by all commands.

use anyhow::{Context as _, Result};
use blog_services::accounts::storage as account_storage;
use blog_services::config::Config;
use blog_services::{AuthContext, BlogService, SqliteContentStore};
use blog_services::store::ContentStore as _;
use sqlx::SqlitePool;
use tracing::instrument;

/// Name used for the operator identity when no `--as` account is given.
pub const OPERATOR: &str = "blogctl";

pub struct AppContext {
    pub service: BlogService<SqliteContentStore>,
    pub auth: AuthContext,
    operator: bool,
}

impl AppContext {
    /// Opens the store for `config` and resolves who the commands act as.
    ///
    /// Without `acting_as` the local operator holds every role. With it, the
    /// stored account's roles apply and its last login is refreshed.
    #[instrument(skip_all, fields(acting_as = acting_as.unwrap_or(OPERATOR)))]
    pub async fn open(config: &Config, acting_as: Option<&str>) -> Result<Self> {
        let store = SqliteContentStore::connect(config)
            .await
            .with_context(|| format!("Failed to open database at {}", config.database_url()))?;

        let auth = match acting_as {
            Some(username) => {
                let account = account_storage::get(store.pool(), username)
                    .await
                    .with_context(|| format!("Cannot act as '{username}'"))?;
                account_storage::touch_login(store.pool(), username).await?;
                AuthContext::from_account(&account)
            }
            None => AuthContext::admin(OPERATOR),
        };

        Ok(Self {
            service: BlogService::new(store),
            operator: acting_as.is_none(),
            auth,
        })
    }

    /// Identity comments are written under. The operator has no stored
    /// account, so its comments are anonymous.
    pub fn commenter(&self) -> AuthContext {
        if self.operator {
            AuthContext::anonymous()
        } else {
            self.auth.clone()
        }
    }

    pub fn is_operator(&self) -> bool {
        self.operator
    }

    pub fn store(&self) -> &SqliteContentStore {
        self.service.store()
    }

    pub fn pool(&self) -> &SqlitePool {
        self.store().pool()
    }

    /// Sweeps orphan tags; used after bulk operations.
    pub async fn sweep(&self) -> Result<u64> {
        Ok(self.store().sweep_orphan_tags().await?)
    }
}
