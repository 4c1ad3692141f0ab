#![allow(clippy::exit)]

//! `blogctl`: operator tool for the blog content store.
//!
//! Every command opens the configured database, resolves who it acts as and
//! goes through the same service layer a web front end would use.

mod cli;
mod commands;
mod context;
mod output;
mod timing;

use anyhow::Result;
use blog_services::config::Config;
use clap::Parser as _;

use crate::cli::{Cli, Commands};
use crate::context::AppContext;
use crate::output::Output;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

async fn run(cli: Cli, config: &Config, out: &Output) -> Result<()> {
    let ctx = AppContext::open(config, cli.acting_as.as_deref()).await?;

    match cli.command {
        Commands::Info => commands::run_info(config, &ctx, out).await,
        Commands::Publish(args) => commands::run_publish(&ctx, out, args).await.map(drop),
        Commands::Edit(args) => commands::run_edit(&ctx, out, args).await,
        Commands::Posts { tag } => commands::run_posts(&ctx, out, tag.as_deref()).await,
        Commands::Show { title, tag } => {
            commands::run_show(&ctx, out, &title, tag.as_deref()).await
        }
        Commands::Delete { title } => commands::run_delete(&ctx, out, &title).await,
        Commands::Comment { title, content } => {
            commands::run_comment(&ctx, out, &title, &content)
                .await
                .map(drop)
        }
        Commands::Tags => commands::run_tags(&ctx, out).await,
        Commands::SweepTags => commands::run_sweep(&ctx, out).await.map(drop),
        Commands::Accounts { command } => commands::run_accounts(&ctx, out, command).await,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::init()?;
    if let Some(url) = &cli.database_url {
        config = config.with_database_url(url);
    }
    timing::init_tracing(&config, cli.verbose, cli.timing)?;
    config.log_loaded();

    let out = Output::new(cli.json);
    if let Err(err) = run(cli, &config, &out).await {
        out.error(format!("{err:#}"));
        std::process::exit(1);
    }
    Ok(())
}
