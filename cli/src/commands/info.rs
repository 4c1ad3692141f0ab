//! Build and database information.

use anyhow::Result;
use blog_services::config::Config;
use blog_services::database;
use serde::Serialize;
use sqlx::SqlitePool;

use crate::context::AppContext;
use crate::output::Output;

const BUILD_DATE: &str = env!("BUILD_DATE");
const BUILD_COMMIT: &str = env!("BUILD_COMMIT");
const BUILD_BRANCH: &str = env!("BUILD_BRANCH");

#[derive(Debug, Serialize)]
struct Info {
    version: &'static str,
    build_date: &'static str,
    commit: &'static str,
    branch: &'static str,
    environment: &'static str,
    database_url: String,
    connected: bool,
    acting_as: Option<String>,
    posts: i64,
    tags: i64,
    comments: i64,
    accounts: i64,
}

async fn count_rows(pool: &SqlitePool, table: &str) -> Result<i64> {
    let count = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await?;
    Ok(count)
}

pub async fn run_info(config: &Config, ctx: &AppContext, out: &Output) -> Result<()> {
    let pool = ctx.pool();
    let info = Info {
        version: env!("CARGO_PKG_VERSION"),
        build_date: BUILD_DATE,
        commit: BUILD_COMMIT,
        branch: BUILD_BRANCH,
        environment: config.environment().as_str(),
        database_url: config.database_url().to_owned(),
        connected: database::is_connected(pool).await,
        acting_as: ctx.auth.username().map(ToOwned::to_owned),
        posts: count_rows(pool, "posts").await?,
        tags: count_rows(pool, "tags").await?,
        comments: count_rows(pool, "comments").await?,
        accounts: count_rows(pool, "users").await?,
    };

    if out.is_json() {
        return out.json(&info);
    }

    out.header(format!("blogctl {}", info.version));
    out.labeled("Built", info.build_date);
    out.labeled("Commit", format!("{} ({})", info.commit, info.branch));
    out.newline();
    out.subheader("Database");
    out.labeled("Environment", info.environment);
    out.labeled("URL", &info.database_url);
    out.labeled("Connected", info.connected);
    out.labeled("Acting as", info.acting_as.as_deref().unwrap_or("anonymous"));
    out.newline();
    out.labeled("Posts", info.posts);
    out.labeled("Tags", info.tags);
    out.labeled("Comments", info.comments);
    out.labeled("Accounts", info.accounts);
    Ok(())
}
