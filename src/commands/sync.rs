//! Keeping local copies of posts: `fetch`, and the files `publish` writes.

use super::api_failure;
use crate::api::PostsApi;
use crate::context::Context;
use crate::prompt::PromptResult;
use crate::protocol::Post;
use anyhow::{bail, Context as _, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{error, info};

/// Extension of local post files.
pub const POST_FILE_EXT: &str = "txt";

/// Marker written in a new posts directory, holding the owner's username.
pub const USER_MARKER_FILE: &str = ".writeas_user";

/// Where a post lives under `dir`: `<alias>/<slug>.txt` for blog posts,
/// `<id>.txt` otherwise.
pub fn post_file_path(dir: &Path, post: &Post) -> PathBuf {
    match &post.collection {
        Some(coll) if !post.slug.is_empty() => dir
            .join(&coll.alias)
            .join(format!("{}.{}", post.slug, POST_FILE_EXT)),
        _ => dir.join(format!("{}.{}", post.id, POST_FILE_EXT)),
    }
}

/// Text of a local post file: a `# Title` header, if any, then the body.
pub fn post_file_contents(post: &Post) -> String {
    if post.title.is_empty() {
        post.content.clone()
    } else {
        format!("# {}\n\n{}", post.title, post.content)
    }
}

/// Write a post under `dir`, stamping the file with the post's last update.
pub fn write_post(dir: &Path, post: &Post) -> Result<PathBuf> {
    let path = post_file_path(dir, post);
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            info!("Creating folder {}", parent.display());
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Error creating blog directory {}", parent.display()))?;
        }
    }

    std::fs::write(&path, post_file_contents(post))
        .with_context(|| format!("Error creating file {}", path.display()))?;

    if let Some(updated) = post.updated {
        let file = std::fs::File::options()
            .write(true)
            .open(&path)
            .with_context(|| format!("Error opening {}", path.display()))?;
        file.set_modified(SystemTime::from(updated))
            .with_context(|| format!("Error setting time on {}", path.display()))?;
    }
    Ok(path)
}

/// Choose and create the posts directory, then save it in the config.
fn set_up_posts_dir<F, W>(ctx: &mut Context, username: &str, ask: F, out: &mut W) -> Result<PathBuf>
where
    F: FnOnce(&str) -> Result<PromptResult>,
    W: Write,
{
    let default_dir = std::env::current_dir().context("Couldn't get current directory")?;
    let answer = match ask(&format!("Posts directory? [{}]: ", default_dir.display()))? {
        PromptResult::Submitted(answer) => answer,
        PromptResult::Cancelled => bail!("Cancelled."),
    };
    let dir = match answer.trim() {
        "" => default_dir,
        dir => PathBuf::from(dir),
    };

    if !dir.exists() {
        let mut builder = std::fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o700);
        }
        builder
            .create(&dir)
            .with_context(|| format!("Error creating posts directory {}", dir.display()))?;
        std::fs::write(dir.join(USER_MARKER_FILE), username)?;
        writeln!(out, "Created posts directory.")?;
    }

    ctx.config.posts.directory = dir.to_string_lossy().to_string();
    ctx.config.save(&ctx.data_dir).context("Unable to save config")?;
    writeln!(out, "Saved config.")?;
    Ok(dir)
}

/// Download every post of the logged-in user into the posts directory.
///
/// Returns how many posts were written. A post that can't be written is
/// logged and skipped.
pub async fn fetch<A, F, W>(ctx: &mut Context, api: &A, ask_dir: F, out: &mut W) -> Result<usize>
where
    A: PostsApi + ?Sized,
    F: FnOnce(&str) -> Result<PromptResult>,
    W: Write,
{
    let username = ctx.require_user("fetch posts")?.username().to_string();

    let dir = match ctx.posts_dir() {
        Some(dir) => dir,
        None => set_up_posts_dir(ctx, &username, ask_dir, out)?,
    };

    let posts = api
        .get_user_posts()
        .await
        .map_err(|e| api_failure(e, "Couldn't fetch posts"))?;

    let mut saved = 0;
    for post in &posts {
        match write_post(&dir, post) {
            Ok(path) => {
                info!("Saved post {}", path.display());
                saved += 1;
            }
            Err(e) => error!("{:#}. Skipping post {}.", e, post.id),
        }
    }
    Ok(saved)
}
