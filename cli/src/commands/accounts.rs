//! Account management. Every subcommand requires the admin role.

use anyhow::Result;
use blog_services::accounts::{Account, Role};
use blog_services::accounts::storage as account_storage;
use blog_services::service::POST_TIME_FORMAT;
use tabled::Tabled;
use tracing::instrument;

use crate::cli::AccountCommands;
use crate::context::AppContext;
use crate::output::Output;

#[derive(Tabled)]
struct AccountRow {
    #[tabled(rename = "Username")]
    username: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Admin")]
    admin: bool,
    #[tabled(rename = "Uploader")]
    uploader: bool,
    #[tabled(rename = "Created")]
    created: String,
    #[tabled(rename = "Last login")]
    last_login: String,
}

impl From<Account> for AccountRow {
    fn from(account: Account) -> Self {
        Self {
            created: account.created.format(POST_TIME_FORMAT).to_string(),
            last_login: account.last_login.format(POST_TIME_FORMAT).to_string(),
            username: account.username,
            email: account.email,
            admin: account.admin,
            uploader: account.uploader,
        }
    }
}

#[instrument(skip_all, name = "accounts")]
pub async fn run_accounts(ctx: &AppContext, out: &Output, command: AccountCommands) -> Result<()> {
    if !ctx.auth.is_admin() {
        anyhow::bail!("Only admins may manage accounts");
    }
    let pool = ctx.pool();

    match command {
        AccountCommands::List => {
            let accounts = account_storage::list(pool).await?;
            if out.is_json() {
                return out.json(&accounts);
            }
            if accounts.is_empty() {
                out.dim("No accounts found.");
                return Ok(());
            }
            let count = accounts.len();
            out.table(accounts.into_iter().map(AccountRow::from));
            out.count("Accounts", count);
        }
        AccountCommands::Add { username, email } => {
            let account = account_storage::create(pool, &username, &email).await?;
            if out.is_json() {
                out.json(&account)?;
            } else {
                out.success(format!("Created account '{}'", account.username));
            }
        }
        AccountCommands::Remove { username } => {
            account_storage::delete(pool, &username).await?;
            if out.is_json() {
                out.json(&serde_json::json!({ "deleted": username }))?;
            } else {
                out.success(format!("Deleted account '{username}'"));
            }
        }
        AccountCommands::Toggle { username, role } => {
            let role: Role = role.into();
            let enabled = account_storage::toggle_role(pool, &username, role).await?;
            if out.is_json() {
                out.json(&serde_json::json!({
                    "username": username,
                    "role": role.to_string(),
                    "enabled": enabled,
                }))?;
            } else {
                let state = if enabled { "granted" } else { "revoked" };
                out.success(format!("{role} role {state} for '{username}'"));
            }
        }
    }
    Ok(())
}
