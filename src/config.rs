//! Configuration management for writeas-cli.
//!
//! Everything lives in one data directory (`~/.writeas` for `writeas`,
//! `~/.writefreely` for `wf`):
//! - `config.ini`: default account and post preferences
//! - `user.json`: cached access token for the logged-in user
//! - `posts.psv`: edit tokens of anonymous posts (see [`crate::store`])
//!
//! Accounts on a named host are kept under `<host>/<user>/user.json`.

use crate::protocol::AuthUser;
use anyhow::{Context, Result};
use ini::Ini;
use std::path::{Path, PathBuf};

/// Application version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent sent when none is given on the command line.
pub const DEFAULT_USER_AGENT: &str = concat!("writeas-cli v", env!("CARGO_PKG_VERSION"));

/// Public URL of the hosted service.
pub const WRITEAS_BASE_URL: &str = "https://write.as";

/// Public URL of the onion service.
pub const TOR_BASE_URL: &str = "http://writeas7pm7rcdqg.onion";

/// INI file holding [`Config`].
pub const CONFIG_FILE: &str = "config.ini";

/// JSON file holding the cached [`AuthUser`].
pub const USER_FILE: &str = "user.json";

/// Which binary is running; decides the data directory and auth rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    /// `writeas`: anonymous posting to write.as.
    Writeas,
    /// `wf`: WriteFreely instances, always authenticated.
    WriteFreely,
}

impl Flavor {
    /// Executable name, used in hints like "run: writeas auth <username>".
    pub fn bin_name(self) -> &'static str {
        match self {
            Flavor::Writeas => "writeas",
            Flavor::WriteFreely => "wf",
        }
    }

    /// Whether publishing commands need a logged-in user.
    pub fn requires_auth(self) -> bool {
        matches!(self, Flavor::WriteFreely)
    }

    fn data_dir_name(self) -> &'static str {
        match (self, cfg!(windows)) {
            (Flavor::Writeas, false) => ".writeas",
            (Flavor::Writeas, true) => "Write.as",
            (Flavor::WriteFreely, false) => ".writefreely",
            (Flavor::WriteFreely, true) => "WriteFreely",
        }
    }

    /// Get the data directory path.
    pub fn data_dir(self) -> Result<PathBuf> {
        let parent = if cfg!(windows) {
            dirs::data_dir()
        } else {
            dirs::home_dir()
        };
        parent
            .map(|p| p.join(self.data_dir_name()))
            .context("Could not determine home directory")
    }
}

/// `[default]` section: the account used when no flags say otherwise.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefaultConfig {
    pub host: String,
    pub user: String,
}

/// `[posts]` section: local post preferences.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostsConfig {
    /// Where `fetch` and `publish` keep local copies of posts.
    pub directory: String,
    pub font: String,
    pub lang: String,
    pub is_rtl: bool,
    /// Blog to post to when `-c` is not given.
    pub collection: String,
}

/// Main configuration structure, stored as `config.ini`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub default: DefaultConfig,
    pub posts: PostsConfig,
}

impl Config {
    /// Get the config file path inside a data directory.
    pub fn path(data_dir: &Path) -> PathBuf {
        data_dir.join(CONFIG_FILE)
    }

    /// Load configuration, using defaults if the file is missing.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = Self::path(data_dir);
        if !path.exists() {
            return Ok(Self::default());
        }
        let ini = Ini::load_from_file(&path)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(Self::from_ini(&ini))
    }

    fn from_ini(ini: &Ini) -> Self {
        let get = |section: &str, key: &str| -> String {
            ini.section(Some(section))
                .and_then(|s| s.get(key))
                .unwrap_or_default()
                .trim()
                .to_string()
        };

        Self {
            default: DefaultConfig {
                host: get("default", "host"),
                user: get("default", "user"),
            },
            posts: PostsConfig {
                directory: get("posts", "directory"),
                font: get("posts", "font"),
                lang: get("posts", "lang"),
                is_rtl: matches!(get("posts", "rtl").to_ascii_lowercase().as_str(), "true" | "1" | "yes"),
                collection: get("posts", "collection"),
            },
        }
    }

    fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        let pairs = [
            ("default", "host", self.default.host.as_str()),
            ("default", "user", self.default.user.as_str()),
            ("posts", "directory", self.posts.directory.as_str()),
            ("posts", "font", self.posts.font.as_str()),
            ("posts", "lang", self.posts.lang.as_str()),
            ("posts", "collection", self.posts.collection.as_str()),
        ];
        for (section, key, value) in pairs {
            if !value.is_empty() {
                ini.with_section(Some(section)).set(key, value);
            }
        }
        if self.posts.is_rtl {
            ini.with_section(Some("posts")).set("rtl", "true");
        }
        ini
    }

    /// Save configuration to file.
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
        let path = Self::path(data_dir);
        self.to_ini()
            .write_to_file(&path)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }
}

/// Directory name for a host: the URL without its scheme or trailing slash.
pub fn host_dir_name(host: &str) -> String {
    let bare = host.split_once("://").map(|(_, rest)| rest).unwrap_or(host);
    bare.trim_end_matches('/').to_string()
}

/// Directory holding `user.json` for an account.
///
/// Without a host this is the data directory itself, which is where the
/// single write.as account lives.
pub fn user_dir(data_dir: &Path, host: Option<&str>, user: Option<&str>) -> PathBuf {
    match host {
        Some(host) if !host.is_empty() => {
            let dir = data_dir.join(host_dir_name(host));
            match user {
                Some(user) if !user.is_empty() => dir.join(user),
                _ => dir,
            }
        }
        _ => data_dir.to_path_buf(),
    }
}

/// Load the cached user, if one is logged in.
pub fn load_user(dir: &Path) -> Result<Option<AuthUser>> {
    let path = dir.join(USER_FILE);
    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read user file: {}", path.display()))
        }
    };
    let user = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse user file: {}", path.display()))?;
    Ok(Some(user))
}

/// Save the authenticated user as pretty-printed JSON, readable only by the
/// owner.
pub fn save_user(dir: &Path, user: &AuthUser) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create user directory: {}", dir.display()))?;
    let path = dir.join(USER_FILE);
    let json = serde_json::to_string_pretty(user)?;
    write_private(&path, json.as_bytes())
        .with_context(|| format!("Failed to write user file: {}", path.display()))
}

/// Remove the cached user. A missing file is not an error.
pub fn delete_user(dir: &Path) -> Result<()> {
    let path = dir.join(USER_FILE);
    match std::fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to delete user file: {}", path.display())),
    }
}

/// Usernames with a saved session on the given host.
pub fn users_for_host(data_dir: &Path, host: &str) -> Result<Vec<String>> {
    users_in(&data_dir.join(host_dir_name(host)))
}

/// Every saved `(host, user)` pair, sorted.
pub fn all_accounts(data_dir: &Path) -> Result<Vec<(String, String)>> {
    let mut accounts = Vec::new();
    let entries = match std::fs::read_dir(data_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(accounts),
        Err(e) => return Err(e).context("Could not read user configuration directory"),
    };
    for entry in entries.flatten() {
        if !entry.path().is_dir() {
            continue;
        }
        let host = entry.file_name().to_string_lossy().to_string();
        for user in users_in(&entry.path())? {
            accounts.push((host.clone(), user));
        }
    }
    accounts.sort();
    Ok(accounts)
}

fn users_in(host_dir: &Path) -> Result<Vec<String>> {
    let entries = match std::fs::read_dir(host_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read {}", host_dir.display()))
        }
    };
    let mut users: Vec<String> = entries
        .flatten()
        .filter(|e| e.path().join(USER_FILE).is_file())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect();
    users.sort();
    Ok(users)
}

/// Write a file with owner-only permissions on Unix.
pub(crate) fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use std::io::Write;

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(contents)
}
