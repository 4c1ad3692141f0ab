//! Tag listing and orphan sweep.

use anyhow::Result;
use blog_services::ContentStore as _;
use tabled::Tabled;
use tracing::instrument;

use crate::context::AppContext;
use crate::output::Output;

#[derive(Tabled)]
struct TagRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
}

#[instrument(skip_all, name = "tags")]
pub async fn run_tags(ctx: &AppContext, out: &Output) -> Result<()> {
    let tags = ctx.store().list_tags(&[]).await?;

    if out.is_json() {
        return out.json(&tags);
    }
    if tags.is_empty() {
        out.dim("No tags found.");
        return Ok(());
    }
    let count = tags.len();
    out.table(tags.into_iter().map(|tag| TagRow {
        id: tag.id,
        name: tag.name,
    }));
    out.count("Tags", count);
    Ok(())
}

/// Deletes tags no post references. Admins only.
#[instrument(skip_all, name = "sweep_tags")]
pub async fn run_sweep(ctx: &AppContext, out: &Output) -> Result<u64> {
    if !ctx.auth.is_admin() {
        anyhow::bail!("Only admins may sweep tags");
    }
    let removed = ctx.sweep().await?;

    if out.is_json() {
        out.json(&serde_json::json!({ "removed": removed }))?;
    } else if removed == 0 {
        out.dim("No orphan tags.");
    } else {
        out.success(format!("Removed {removed} orphan tag(s)"));
    }
    Ok(removed)
}
