//! Creating, reading, updating and deleting single posts.

use super::{api_failure, sync, PostOptions};
use crate::api::{ApiError, PostsApi};
use crate::clipboard;
use crate::context::Context;
use crate::editor::{self, Draft};
use crate::fonts::PostFont;
use crate::protocol::{Post, PostParams};
use crate::text::extract_title;
use anyhow::{anyhow, bail, Context as _, Result};
use std::io::{Read, Write};
use std::path::Path;
use tracing::{debug, info, warn};

/// Printed when there is nothing to post.
pub const EMPTY_POST: &str = "Empty post. Bye!";

/// A post that was just created, with its public URL.
#[derive(Debug)]
pub struct Published {
    pub post: Post,
    pub url: String,
}

/// Read a whole post from stdin.
pub fn read_stdin() -> Result<String> {
    if atty::is(atty::Stream::Stdin) {
        eprintln!("Enter your post, then press Ctrl-D on a new line to publish.");
    }
    read_post(std::io::stdin().lock()).context("Error reading from stdin")
}

/// Read all of `reader` as text. Invalid UTF-8 becomes U+FFFD.
fn read_post<R: Read>(mut reader: R) -> std::io::Result<String> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Create a post from `text`.
///
/// Returns `None`, without touching the network, when `text` is blank.
/// Anonymous posts are recorded in the local store so they can be edited
/// later.
pub async fn create<A: PostsApi + ?Sized>(
    ctx: &Context,
    api: &A,
    text: &str,
    opts: &PostOptions,
) -> Result<Option<Published>> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    if ctx.flavor.requires_auth() {
        ctx.require_user("publish")?;
    }

    let (title, content) = extract_title(text);
    let font = PostFont::resolve(
        opts.code,
        opts.font.as_deref().unwrap_or_default(),
        &ctx.config.posts.font,
    );
    let params = PostParams {
        title,
        content,
        font: font.to_string(),
        rtl: ctx.config.posts.is_rtl.then_some(true),
        language: ctx.language(opts.lang.as_deref(), true),
        collection: ctx.collection(opts.collection.as_deref()),
        ..Default::default()
    };

    if ctx.tor {
        info!("Posting to hidden service...");
    } else {
        info!("Posting...");
    }
    let post = api
        .create_post(&params)
        .await
        .map_err(|e| api_failure(e, "Unable to post"))?;

    if !api.is_authenticated() && !post.token.is_empty() {
        ctx.store().append(&post.id, &post.token)?;
    }

    let url = match &post.collection {
        Some(coll) if !coll.url.is_empty() => format!("{}{}", coll.url, post.slug),
        _ => ctx.post_url(&post.id, opts.md),
    };
    Ok(Some(Published { post, url }))
}

/// Copy the URL of a new post to the clipboard and print it.
pub fn announce<W: Write>(published: &Published, out: &mut W) -> Result<()> {
    match clipboard::copy(&published.url) {
        Ok(()) => info!("Copied to clipboard."),
        Err(e) => warn!("Didn't copy to clipboard: {}", e),
    }
    writeln!(out, "{}", published.url)?;
    Ok(())
}

/// `post`: publish text read from stdin.
pub async fn post<A, W>(ctx: &Context, api: &A, text: &str, opts: &PostOptions, out: &mut W) -> Result<Option<Post>>
where
    A: PostsApi + ?Sized,
    W: Write,
{
    match create(ctx, api, text, opts).await? {
        Some(published) => {
            announce(&published, out)?;
            Ok(Some(published.post))
        }
        None => {
            eprintln!("{}", EMPTY_POST);
            Ok(None)
        }
    }
}

/// `new`: compose a post in an editor, then publish it.
///
/// The draft is kept when posting fails so it can be retried.
pub async fn new_post<A, W>(ctx: &Context, api: &A, opts: &PostOptions, out: &mut W) -> Result<Option<Post>>
where
    A: PostsApi + ?Sized,
    W: Write,
{
    let draft: Draft = editor::compose()?;
    if draft.contents.trim().is_empty() {
        draft.discard();
        eprintln!("{}", EMPTY_POST);
        return Ok(None);
    }

    match create(ctx, api, &draft.contents, opts).await {
        Ok(Some(published)) => {
            draft.discard();
            announce(&published, out)?;
            Ok(Some(published.post))
        }
        Ok(None) => Ok(None),
        Err(e) => Err(anyhow!(
            "Error posting: {}\n{}",
            e,
            editor::retry_message(&draft.path, ctx.flavor.bin_name())
        )),
    }
}

/// `publish`: post the contents of a file, saving a copy in the posts
/// directory when one is configured.
pub async fn publish<A, W>(ctx: &Context, api: &A, file: &Path, opts: &PostOptions, out: &mut W) -> Result<Option<Post>>
where
    A: PostsApi + ?Sized,
    W: Write,
{
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Couldn't read {}", file.display()))?;

    let Some(published) = create(ctx, api, &text, opts).await? else {
        eprintln!("{}", EMPTY_POST);
        return Ok(None);
    };
    announce(&published, out)?;

    if let Some(dir) = ctx.posts_dir() {
        let path = sync::write_post(&dir, &published.post)?;
        debug!("Saved local copy at {}", path.display());
    }
    Ok(Some(published.post))
}

/// Edit token for a post: the argument, else the local store.
///
/// A logged-in user can manage their own posts without a token, so an empty
/// token is returned for them.
fn resolve_token(ctx: &Context, id: &str, token: Option<&str>, verb: &str) -> Result<String> {
    if let Some(token) = token.filter(|t| !t.is_empty()) {
        return Ok(token.to_string());
    }
    if let Some(token) = ctx.store().find(id)? {
        return Ok(token);
    }
    if ctx.user.is_some() {
        return Ok(String::new());
    }
    bail!(
        "Couldn't find an edit token locally. Did you create this post here?\n\
         If you have an edit token, use: {} {} {} <token>",
        ctx.flavor.bin_name(),
        verb,
        id
    )
}

fn edit_failure(err: ApiError, summary: &str) -> anyhow::Error {
    if err.is_transport() {
        return api_failure(err, summary);
    }
    anyhow::Error::new(err).context(format!(
        "{}: Post doesn't exist, or bad edit token given.",
        summary
    ))
}

/// `delete`: delete a post remotely, then forget it locally.
pub async fn delete<A: PostsApi + ?Sized>(ctx: &Context, api: &A, id: &str, token: Option<&str>) -> Result<()> {
    let token = resolve_token(ctx, id, token, "delete")?;

    if ctx.tor {
        info!("Deleting via hidden service...");
    } else {
        info!("Deleting...");
    }
    api.delete_post(id, &token)
        .await
        .map_err(|e| edit_failure(e, "Couldn't delete remote copy"))?;
    info!("Post deleted.");

    // The remote copy is gone; local cleanup is best effort.
    if let Err(e) = ctx.store().remove(id) {
        warn!("Couldn't remove {} from local posts: {:#}", id, e);
    }
    if let Some(dir) = ctx.posts_dir() {
        let path = dir.join(format!("{}.{}", id, sync::POST_FILE_EXT));
        if path.exists() {
            if let Err(e) = std::fs::remove_file(&path) {
                warn!("Couldn't delete local copy {}: {}", path.display(), e);
            }
        }
    }
    Ok(())
}

/// `update`: replace a post's text.
pub async fn update<A: PostsApi + ?Sized>(
    ctx: &Context,
    api: &A,
    id: &str,
    token: Option<&str>,
    text: &str,
    opts: &PostOptions,
) -> Result<()> {
    let token = resolve_token(ctx, id, token, "update")?;

    let (title, content) = extract_title(text);
    let font = if opts.code || opts.font.is_some() {
        PostFont::resolve(opts.code, opts.font.as_deref().unwrap_or_default(), "").to_string()
    } else {
        String::new()
    };
    let params = PostParams {
        title,
        content,
        font,
        language: ctx.language(opts.lang.as_deref(), false),
        ..Default::default()
    };

    if ctx.tor {
        info!("Updating via hidden service...");
    } else {
        info!("Updating...");
    }
    api.update_post(id, &token, &params)
        .await
        .map_err(|e| edit_failure(e, "Couldn't update post"))?;
    info!("Post updated.");
    Ok(())
}

/// `get`: print a post, with its title as a `# ` header.
pub async fn get<A, W>(ctx: &Context, api: &A, id: &str, out: &mut W) -> Result<()>
where
    A: PostsApi + ?Sized,
    W: Write,
{
    if ctx.tor {
        info!("Getting via hidden service...");
    } else {
        info!("Getting...");
    }
    let post = api.get_post(id).await.map_err(|e| match e {
        ApiError::NotFound => anyhow::Error::new(e).context("Post not found."),
        ApiError::Gone => anyhow::Error::new(e).context("Post unpublished by author."),
        e => api_failure(e, "Couldn't get post"),
    })?;

    if !post.title.is_empty() {
        write!(out, "# {}\n\n", post.title)?;
    }
    writeln!(out, "{}", post.content)?;
    Ok(())
}

/// `add`: remember the edit token of a post created elsewhere.
pub fn add(ctx: &Context, id: &str, token: &str) -> Result<()> {
    ctx.store().append(id, token)
}
