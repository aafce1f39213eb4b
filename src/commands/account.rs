//! Account commands: `auth`, `logout`, `claim` and `accounts`.

use super::api_failure;
use crate::api::{ApiError, PostsApi};
use crate::config::{self, host_dir_name};
use crate::context::Context;
use crate::prompt::PromptResult;
use crate::protocol::OwnedPostParams;
use anyhow::{bail, Result};
use std::io::Write;
use tracing::{error, info, warn};

/// `auth`: log in and save the session.
///
/// `read_password` is only called once the username checks out. The first
/// account ever logged in becomes the default.
pub async fn auth<A, F>(ctx: &mut Context, api: &A, username: &str, read_password: F) -> Result<()>
where
    A: PostsApi + ?Sized,
    F: FnOnce() -> Result<PromptResult>,
{
    let bin = ctx.flavor.bin_name();
    // Without a host there is room for one saved session only.
    let shared = match ctx.host {
        None => config::load_user(&ctx.data_dir)?,
        Some(_) => None,
    };
    if let Some(user) = ctx.user.as_ref().or(shared.as_ref()).filter(|u| !u.access_token.is_empty()) {
        bail!(
            "You're already authenticated as {}. Log out with: {} logout",
            user.username(),
            bin
        );
    }
    if username.is_empty() {
        bail!("usage: {} auth <username>", bin);
    }

    let password = match read_password()? {
        PromptResult::Submitted(p) if !p.is_empty() => p,
        _ => bail!("Please enter your password."),
    };

    let user = api
        .log_in(username, &password)
        .await
        .map_err(|e| api_failure(e, "error logging in"))?;

    let name = match user.username() {
        "" => username.to_string(),
        n => n.to_string(),
    };
    let dir = config::user_dir(&ctx.data_dir, ctx.host.as_deref(), Some(&name));
    config::save_user(&dir, &user)?;
    info!("Logged in as {}.", name);

    if ctx.config.default.user.is_empty() {
        ctx.config.default.host = ctx.host.clone().unwrap_or_default();
        ctx.config.default.user = name.clone();
        ctx.config.save(&ctx.data_dir)?;
        info!("Saved {} as the default account.", name);
    }

    ctx.username = Some(name);
    ctx.user = Some(user);
    Ok(())
}

/// `logout`: end the session remotely and forget it locally.
pub async fn logout<A: PostsApi + ?Sized>(ctx: &mut Context, api: &A) -> Result<()> {
    if ctx.user.is_none() {
        bail!(
            "Not currently logged in. Authenticate with: {} auth <username>",
            ctx.flavor.bin_name()
        );
    }

    match api.log_out().await {
        Ok(()) => {}
        // The server already forgot this token
        Err(ApiError::InvalidToken) => warn!("Access token was already invalid."),
        Err(e) => return Err(api_failure(e, "Problem logging out")),
    }

    config::delete_user(&ctx.user_dir())?;

    let name = ctx.username.clone().unwrap_or_default();
    let host = ctx.host.clone().unwrap_or_default();
    let defaults = &ctx.config.default;
    if !defaults.user.is_empty() && defaults.user == name && host_dir_name(&defaults.host) == host_dir_name(&host) {
        ctx.config.default = Default::default();
        ctx.config.save(&ctx.data_dir)?;
    }

    info!("Logged out.");
    ctx.user = None;
    Ok(())
}

/// `claim`: move local anonymous posts into the logged-in account.
///
/// Only posts the server accepted are removed from the local store.
pub async fn claim<A, W>(ctx: &Context, api: &A, out: &mut W) -> Result<()>
where
    A: PostsApi + ?Sized,
    W: Write,
{
    let user = ctx.require_user("claim local posts")?;
    let store = ctx.store();
    let local = store.list()?;
    if local.is_empty() {
        info!("No local posts to claim.");
        return Ok(());
    }

    let owned: Vec<OwnedPostParams> = local
        .into_iter()
        .map(|p| OwnedPostParams {
            id: p.id,
            token: p.edit_token,
        })
        .collect();
    let results = api
        .claim_posts(&owned)
        .await
        .map_err(|e| api_failure(e, "Failed to claim posts"))?;

    for result in &results {
        write!(out, "Adding {} to user {}..", result.post_id(), user.username())?;
        if result.is_success() {
            writeln!(out, " OK")?;
            store.remove(result.post_id())?;
        } else {
            writeln!(out, " Failed")?;
            error!("Failed claiming post {}: {}", result.post_id(), result.error_msg);
        }
    }
    Ok(())
}

/// `accounts`: every saved session, with the default marked.
pub fn accounts<W: Write>(ctx: &Context, out: &mut W) -> Result<()> {
    let writeas_host = host_dir_name(config::WRITEAS_BASE_URL);
    let mut found = config::all_accounts(&ctx.data_dir)?;
    // The write.as account lives at the top of the data directory.
    if let Some(user) = config::load_user(&ctx.data_dir)? {
        found.insert(0, (writeas_host.clone(), user.username().to_string()));
    }

    if found.is_empty() {
        writeln!(out, "No accounts found. Log in with: {} auth <username>", ctx.flavor.bin_name())?;
        return Ok(());
    }

    let default_host = host_dir_name(&ctx.config.default.host);
    for (host, user) in found {
        let is_default = user == ctx.config.default.user
            && (host == default_host || (default_host.is_empty() && host == writeas_host));
        let marker = if is_default { " (default)" } else { "" };
        writeln!(out, "[{}] {}{}", host, user, marker)?;
    }
    Ok(())
}
