//! Post commands: publish, edit, list, show, delete and comment.

use std::io::Read as _;
use std::path::Path;

use anyhow::{Context as _, Result};
use blog_services::posts::storage as post_storage;
use blog_services::service::{EditForm, POST_TIME_FORMAT, PublishForm};
use blog_services::{ContentStore as _, PageView, PostImage, PostSummary};
use serde::Serialize;
use serde_json::json;
use tabled::Tabled;
use tracing::instrument;

use crate::cli::{EditArgs, PublishArgs};
use crate::context::AppContext;
use crate::output::{Output, truncate_str};

/// Table and JSON row for the post listing. Thumbnails are left out.
#[derive(Tabled, Serialize)]
struct PostRow {
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Posted")]
    posted: String,
    #[tabled(rename = "Uploader")]
    uploader: String,
    #[tabled(rename = "Views")]
    views: i64,
    #[tabled(rename = "Tags")]
    tags: String,
    #[tabled(rename = "Flags")]
    flags: String,
}

impl From<&PostSummary> for PostRow {
    fn from(post: &PostSummary) -> Self {
        let mut flags = Vec::new();
        if post.unlisted {
            flags.push("unlisted");
        }
        if post.link_post {
            flags.push("link");
        }
        Self {
            title: truncate_str(&post.title, 40),
            posted: post.post_time.format(POST_TIME_FORMAT).to_string(),
            uploader: post.uploader.clone(),
            views: post.views,
            tags: post
                .tags
                .iter()
                .map(|tag| tag.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            flags: flags.join(","),
        }
    }
}

async fn read_file(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

/// Loads an image and its thumbnail. Without a thumbnail the image is reused.
async fn read_image(image: Option<&Path>, thumbnail: Option<&Path>) -> Result<Option<PostImage>> {
    let Some(image_path) = image else {
        return Ok(None);
    };
    let image = read_file(image_path).await?;
    let thumbnail = match thumbnail {
        Some(path) => read_file(path).await?,
        None => image.clone(),
    };
    Ok(Some(PostImage::new(image, thumbnail)))
}

fn read_stdin() -> Result<String> {
    let mut body = String::new();
    std::io::stdin()
        .read_to_string(&mut body)
        .context("Failed to read post body from stdin")?;
    Ok(body)
}

#[instrument(skip_all, name = "publish", fields(title = %args.title))]
pub async fn run_publish(ctx: &AppContext, out: &Output, args: PublishArgs) -> Result<i64> {
    let content = if args.stdin { read_stdin()? } else { args.content };
    let image = read_image(args.image.as_deref(), args.thumbnail.as_deref())
        .await?
        .unwrap_or_default();

    let form = PublishForm {
        title: args.title.clone(),
        content,
        tags: args.tags,
        post_time: args.time,
        unlisted: args.unlisted,
        link_post: args.link.is_some(),
        url_link: args.link.unwrap_or_default(),
        image,
    };
    let id = ctx.service.publish(&ctx.auth, form).await?;

    if out.is_json() {
        out.json(&json!({ "id": id, "title": args.title }))?;
    } else {
        out.success(format!("Published '{}' (id {id})", args.title));
    }
    Ok(id)
}

/// Edits a post. Fields not given on the command line keep their stored values.
#[instrument(skip_all, name = "edit", fields(title = %args.title))]
pub async fn run_edit(ctx: &AppContext, out: &Output, args: EditArgs) -> Result<()> {
    let current = ctx.store().get_post(&args.title).await?;

    let tags = match args.tags {
        Some(tags) => tags,
        None => current
            .tags
            .iter()
            .map(|tag| tag.name.as_str())
            .collect::<Vec<_>>()
            .join(","),
    };
    let (link_post, url_link) = match args.link {
        Some(url) if url.trim().is_empty() => (false, String::new()),
        Some(url) => (true, url),
        None => (current.link_post, current.url_link),
    };
    let new_title = args.rename.unwrap_or_else(|| current.title.clone());

    let form = EditForm {
        original_title: args.title,
        title: new_title.clone(),
        content: args.content.unwrap_or(current.content),
        tags,
        post_time: args.time.unwrap_or_default(),
        unlisted: args.unlisted.unwrap_or(current.unlisted),
        link_post,
        url_link,
        image: read_image(args.image.as_deref(), args.thumbnail.as_deref()).await?,
    };
    ctx.service.edit(&ctx.auth, form).await?;

    if out.is_json() {
        out.json(&json!({ "title": new_title }))?;
    } else {
        out.success(format!("Updated '{new_title}'"));
    }
    Ok(())
}

#[instrument(skip_all, name = "posts", fields(tag = tag.unwrap_or("all")))]
pub async fn run_posts(ctx: &AppContext, out: &Output, tag: Option<&str>) -> Result<()> {
    let page = ctx.service.home(&ctx.auth, tag).await?;
    let rows: Vec<PostRow> = page.posts.iter().map(PostRow::from).collect();

    if out.is_json() {
        return out.json(&rows);
    }
    if rows.is_empty() {
        out.dim("No posts found.");
        return Ok(());
    }
    if let Some(tag) = &page.selected_tag {
        out.subheader(format!("Tagged '{tag}'"));
    }
    let count = rows.len();
    out.table(rows);
    out.count("Posts", count);
    Ok(())
}

fn print_page(out: &Output, page: &PageView) {
    let post = &page.post;
    out.header(&post.title);
    out.labeled("Posted", post.post_time.format(POST_TIME_FORMAT));
    out.labeled("Uploader", &post.uploader);
    out.labeled("Views", post.views);
    if !post.tags.is_empty() {
        let names: Vec<&str> = post.tags.iter().map(|tag| tag.name.as_str()).collect();
        out.labeled("Tags", names.join(", "));
    }
    if post.link_post {
        out.labeled("Link", &post.url_link);
    }
    if post.unlisted {
        out.labeled("Visibility", "unlisted");
    }
    out.divider(60);
    out.print(&post.content);
    out.divider(60);

    if post.comments.is_empty() {
        out.dim("No comments yet.");
    } else {
        out.subheader(format!("Comments ({})", post.comments.len()));
        for comment in &post.comments {
            let author = comment.username.as_deref().unwrap_or("anonymous");
            out.labeled(
                format!("{author} @ {}", comment.post_time.format(POST_TIME_FORMAT)),
                &comment.content,
            );
        }
    }

    out.newline();
    if let Some(tag) = &page.follow_tag {
        out.dim(format!("Navigating within '{tag}'"));
    }
    out.labeled("Previous", page.adjacent.previous.as_deref().unwrap_or("-"));
    out.labeled("Next", page.adjacent.next.as_deref().unwrap_or("-"));
}

#[instrument(skip_all, name = "show", fields(title = %title, tag = tag.unwrap_or("")))]
pub async fn run_show(ctx: &AppContext, out: &Output, title: &str, tag: Option<&str>) -> Result<()> {
    let page = ctx.service.view_page(&ctx.auth, title, tag).await?;

    if out.is_json() {
        let post = &page.post;
        return out.json(&json!({
            "id": post.id,
            "title": post.title,
            "content": post.content,
            "post_time": post.post_time,
            "uploader": post.uploader,
            "views": post.views,
            "unlisted": post.unlisted,
            "url_link": post.link_post.then_some(&post.url_link),
            "tags": post.tags,
            "comments": post.comments,
            "adjacent": page.adjacent,
        }));
    }
    print_page(out, &page);
    Ok(())
}

#[instrument(skip_all, name = "delete", fields(title = %title))]
pub async fn run_delete(ctx: &AppContext, out: &Output, title: &str) -> Result<()> {
    ctx.service.delete(&ctx.auth, title).await?;
    if out.is_json() {
        out.json(&json!({ "deleted": title }))?;
    } else {
        out.success(format!("Deleted '{title}'"));
    }
    Ok(())
}

#[instrument(skip_all, name = "comment", fields(title = %title))]
pub async fn run_comment(ctx: &AppContext, out: &Output, title: &str, content: &str) -> Result<i64> {
    let post_id = post_storage::id_for_title(ctx.pool(), title).await?;
    let id = ctx
        .service
        .comment(&ctx.commenter(), post_id, content)
        .await?;

    if out.is_json() {
        out.json(&json!({ "id": id, "post_id": post_id }))?;
    } else {
        out.success(format!("Commented on '{title}'"));
    }
    Ok(id)
}
