//! Request context shared by every command.
//!
//! Resolves which host and account a command talks to, how to reach the API,
//! and the per-post defaults that come from flags, config and the
//! environment.

use crate::api::{ClientConfig, WriteasClient, DEFAULT_TOR_PORT, TOR_API_URL, WRITEAS_API_URL};
use crate::config::{self, Config, Flavor, DEFAULT_USER_AGENT, TOR_BASE_URL, WRITEAS_BASE_URL};
use crate::protocol::AuthUser;
use crate::store::PostStore;
use anyhow::{bail, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Connection options taken from the global command-line flags.
#[derive(Debug, Clone, Default)]
pub struct ConnectOptions {
    pub host: Option<String>,
    pub user: Option<String>,
    pub tor: bool,
    pub tor_port: Option<u16>,
    pub user_agent: Option<String>,
}

/// Everything a command needs to know about where it is running.
#[derive(Debug, Clone)]
pub struct Context {
    pub flavor: Flavor,
    pub data_dir: PathBuf,
    pub config: Config,
    /// Host URL with scheme, when not talking to write.as.
    pub host: Option<String>,
    /// Username selected by flags or config, even if not logged in.
    pub username: Option<String>,
    /// Saved session for the selected account.
    pub user: Option<AuthUser>,
    pub tor: bool,
    pub tor_port: u16,
    pub user_agent: String,
}

impl Context {
    /// Load config and the selected account from `data_dir`.
    pub fn load(flavor: Flavor, data_dir: &Path, opts: ConnectOptions) -> Result<Self> {
        let config = Config::load(data_dir)?;

        let mut host = opts.host.as_deref().map(normalize_host).filter(|h| !h.is_empty());
        let mut username = opts.user.filter(|u| !u.is_empty());

        if host.is_none() && !config.default.host.is_empty() {
            host = Some(normalize_host(&config.default.host));
            if username.is_none() && !config.default.user.is_empty() {
                username = Some(config.default.user.clone());
            }
        } else if host.is_none() && username.is_none() && !config.default.user.is_empty() {
            username = Some(config.default.user.clone());
        }

        if let (Some(h), None) = (&host, &username) {
            let users = config::users_for_host(data_dir, h)?;
            match users.len() {
                0 => {}
                1 => username = users.into_iter().next(),
                _ => bail!(
                    "{} has multiple accounts, specify which to use with --user: {}",
                    h,
                    users.join(", ")
                ),
            }
        }

        let user_dir = config::user_dir(data_dir, host.as_deref(), username.as_deref());
        let mut user = config::load_user(&user_dir)?;
        // Without a host every write.as session shares one file, so it may
        // belong to someone other than the requested user.
        let mismatched = match (username.as_deref(), user.as_ref()) {
            (Some(name), Some(saved)) => !saved.username().is_empty() && saved.username() != name,
            _ => false,
        };
        if mismatched {
            debug!("Ignoring the saved session, it belongs to another user");
            user = None;
        }
        debug!(
            "Using host {} as {}",
            host.as_deref().unwrap_or(WRITEAS_BASE_URL),
            username.as_deref().unwrap_or("anonymous")
        );

        Ok(Self {
            flavor,
            data_dir: data_dir.to_path_buf(),
            config,
            host,
            username,
            user,
            tor: opts.tor,
            tor_port: opts.tor_port.unwrap_or(DEFAULT_TOR_PORT),
            user_agent: user_agent(opts.user_agent.as_deref()),
        })
    }

    /// Directory holding `user.json` for the selected account.
    pub fn user_dir(&self) -> PathBuf {
        config::user_dir(&self.data_dir, self.host.as_deref(), self.username.as_deref())
    }

    pub fn store(&self) -> PostStore {
        PostStore::in_dir(&self.data_dir)
    }

    /// The logged-in user, or an error telling how to log in.
    pub fn require_user(&self, action: &str) -> Result<&AuthUser> {
        match &self.user {
            Some(u) if !u.access_token.is_empty() => Ok(u),
            _ => bail!(
                "You must be authenticated to {}.\nLog in first with: {} auth <username>",
                action,
                self.flavor.bin_name()
            ),
        }
    }

    /// Root URL of the API.
    pub fn api_url(&self) -> String {
        match (&self.host, self.tor) {
            (Some(host), _) => format!("{}/api", host),
            (None, true) => TOR_API_URL.to_string(),
            (None, false) => WRITEAS_API_URL.to_string(),
        }
    }

    /// Root URL of public post pages.
    pub fn base_url(&self) -> &str {
        match (&self.host, self.tor) {
            (Some(host), _) => host,
            (None, true) => TOR_BASE_URL,
            (None, false) => WRITEAS_BASE_URL,
        }
    }

    /// Public URL of a post by ID or path, with `.md` for the raw text.
    pub fn post_url(&self, id: &str, markdown: bool) -> String {
        let ext = if markdown { ".md" } else { "" };
        format!("{}/{}{}", self.base_url(), id, ext)
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.api_url(),
            tor_port: self.tor.then_some(self.tor_port),
            token: self
                .user
                .as_ref()
                .map(|u| u.access_token.clone())
                .filter(|t| !t.is_empty()),
            user_agent: self.user_agent.clone(),
        }
    }

    /// HTTP client for the selected host and account.
    pub fn client(&self) -> Result<WriteasClient> {
        Ok(WriteasClient::new(self.client_config())?)
    }

    /// Post language: the flag, else `posts.lang`, else (when `auto`) the
    /// locale.
    pub fn language(&self, flag: Option<&str>, auto: bool) -> Option<String> {
        if let Some(lang) = flag.filter(|l| !l.is_empty()) {
            return Some(lang.to_string());
        }
        if !self.config.posts.lang.is_empty() {
            return Some(self.config.posts.lang.clone());
        }
        if !auto {
            return None;
        }
        let detected = detect_language(|key| std::env::var(key).ok());
        if detected.is_none() {
            debug!("Language detection failed");
        }
        detected
    }

    /// Destination blog: the `-c`/`-b` flag, else `posts.collection`.
    pub fn collection(&self, flag: Option<&str>) -> Option<String> {
        flag.filter(|s| !s.is_empty())
            .or_else(|| Some(self.config.posts.collection.as_str()).filter(|s| !s.is_empty()))
            .map(str::to_string)
    }

    /// Configured local posts directory, if any.
    pub fn posts_dir(&self) -> Option<PathBuf> {
        Some(self.config.posts.directory.as_str())
            .filter(|d| !d.is_empty())
            .map(PathBuf::from)
    }
}

/// User-Agent header value. A custom agent keeps ours in parentheses.
pub fn user_agent(custom: Option<&str>) -> String {
    match custom.filter(|ua| !ua.is_empty()) {
        Some(ua) => format!("{} ({})", ua, DEFAULT_USER_AGENT),
        None => DEFAULT_USER_AGENT.to_string(),
    }
}

/// Add `https://` to a bare host name and drop any trailing slash.
pub fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.is_empty() || host.contains("://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

/// Language code from the POSIX locale variables, e.g. `en` for
/// `en_US.UTF-8`.
pub fn detect_language<F>(lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    let locale = ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .filter_map(|key| lookup(key))
        .find(|v| !v.is_empty())?;

    let lang = locale
        .split(['_', '.', '@', '-'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();

    match lang.as_str() {
        "" | "c" | "posix" => None,
        _ if lang.chars().all(|c| c.is_ascii_alphabetic()) => Some(lang),
        _ => None,
    }
}
