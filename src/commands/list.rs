//! `posts` and `blogs` listings.

use super::{api_failure, sync, Table};
use crate::api::PostsApi;
use crate::context::Context;
use crate::protocol::Post;
use crate::text::excerpt;
use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use clap::Args;
use std::io::Write;
use std::path::Path;

const DASH_BAR: &str = "--------------------------------------------------------------------------------";

/// Flags of the `posts` command.
#[derive(Args, Debug, Clone, Default)]
pub struct ListOptions {
    /// Show list with post IDs (default)
    #[arg(long)]
    pub id: bool,

    /// Show list with URLs
    #[arg(long)]
    pub url: bool,

    /// Use with --url to return URLs to Markdown versions of posts
    #[arg(long)]
    pub md: bool,

    /// Show a detailed block for each account post
    #[arg(short = 'd')]
    pub details: bool,
}

impl ListOptions {
    fn show_ids(&self) -> bool {
        self.id || !self.url
    }
}

/// An account post, as shown in listings.
#[derive(Debug, Clone, PartialEq)]
pub struct RemotePost {
    pub id: String,
    pub edit_token: String,
    pub title: String,
    pub excerpt: String,
    pub slug: String,
    /// Alias of the blog the post is on, if any.
    pub collection: String,
    pub updated: Option<DateTime<Utc>>,
    /// Whether a local copy exists in the posts directory.
    pub synced: bool,
}

impl RemotePost {
    pub fn from_post(post: &Post, posts_dir: Option<&Path>) -> Self {
        Self {
            id: post.id.clone(),
            edit_token: post.token.clone(),
            title: post.title.clone(),
            excerpt: excerpt(&post.content),
            slug: post.slug.clone(),
            collection: post
                .collection
                .as_ref()
                .map(|c| c.alias.clone())
                .unwrap_or_default(),
            updated: post.updated,
            synced: posts_dir.is_some_and(|dir| sync::post_file_path(dir, post).is_file()),
        }
    }
}

fn sync_label(synced: bool) -> &'static str {
    if synced {
        "synced"
    } else {
        "unsynced"
    }
}

fn pretty_date(date: Option<DateTime<Utc>>) -> String {
    date.map(|d| d.with_timezone(&Local).format("%d %b %y %H:%M %Z").to_string())
        .unwrap_or_default()
}

fn write_details<W: Write>(ctx: &Context, post: &RemotePost, opts: &ListOptions, out: &mut W) -> Result<()> {
    let path = match (post.slug.is_empty(), post.collection.is_empty()) {
        (true, _) => post.id.clone(),
        (false, true) => post.slug.clone(),
        (false, false) => format!("{}/{}", post.collection, post.slug),
    };
    let url = ctx.post_url(&path, opts.md);
    let slug = if post.slug.is_empty() { "no-slug" } else { &post.slug };
    let blog = if post.collection.is_empty() { "no-blog" } else { &post.collection };

    writeln!(out)?;
    let mut table = Table::new(10, 2);
    table.row(["Title: ", post.title.as_str()]);
    table.row(["Last Updated: ".to_string(), pretty_date(post.updated)]);
    table.row(["Blog: ", blog]);
    table.row(["Slug/ID: ".to_string(), format!("{} / {}", slug, post.id)]);
    table.row(["URL: ", url.as_str()]);
    table.write_to(out)?;
    writeln!(out)?;
    writeln!(out, "{}", post.excerpt)?;
    writeln!(out, "{}", DASH_BAR)?;
    Ok(())
}

/// `posts`: local unsynced posts, newest first, then the account's posts
/// when logged in.
pub async fn list_posts<A, W>(ctx: &Context, api: &A, opts: &ListOptions, out: &mut W) -> Result<()>
where
    A: PostsApi + ?Sized,
    W: Write,
{
    let local = ctx.store().list()?;
    let mut table = Table::new(10, 2);
    if local.is_empty() {
        writeln!(out, "No local posts found")?;
    } else {
        let column = if opts.show_ids() { "ID" } else { "URL" };
        table.row(["Local", column, "Token"]);
        for post in local.iter().rev() {
            let identifier = if opts.show_ids() {
                post.id.clone()
            } else {
                ctx.post_url(&post.id, opts.md)
            };
            table.row(["unsynced".to_string(), identifier, post.edit_token.clone()]);
        }
        table.write_to(out)?;
    }

    if ctx.user.is_none() {
        return Ok(());
    }

    let posts = api
        .get_user_posts()
        .await
        .map_err(|e| api_failure(e, "Couldn't get account posts"))?;
    let posts_dir = ctx.posts_dir();
    let remote: Vec<RemotePost> = posts
        .iter()
        .map(|p| RemotePost::from_post(p, posts_dir.as_deref()))
        .collect();
    if remote.is_empty() {
        return Ok(());
    }

    if opts.details {
        for post in &remote {
            write_details(ctx, post, opts, out)?;
        }
        return Ok(());
    }

    let mut table = Table::new(10, 2);
    table.row(["Account", if opts.show_ids() { "ID" } else { "URL" }, "Title"]);
    for post in &remote {
        let identifier = if opts.show_ids() {
            post.id.clone()
        } else {
            ctx.post_url(&post.id, opts.md)
        };
        table.row([sync_label(post.synced).to_string(), identifier, post.title.clone()]);
    }
    writeln!(out)?;
    table.write_to(out)?;
    Ok(())
}

/// `blogs`: the logged-in user's blogs.
pub async fn list_blogs<A, W>(ctx: &Context, api: &A, urls: bool, out: &mut W) -> Result<()>
where
    A: PostsApi + ?Sized,
    W: Write,
{
    let user = ctx.require_user("view blogs")?;
    let collections = api
        .get_user_collections()
        .await
        .map_err(|e| api_failure(e, &format!("Couldn't get blogs for user {}", user.username())))?;

    let mut table = Table::new(8, 2);
    table.row(["Alias", if urls { "URL" } else { "Title" }]);
    for coll in &collections {
        let detail = if urls { &coll.url } else { &coll.title };
        table.row([coll.alias.as_str(), detail.as_str()]);
    }
    table.write_to(out)?;
    Ok(())
}
