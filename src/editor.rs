//! Compose a post in the user's text editor.

use anyhow::{anyhow, bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command as ProcessCommand;
use tracing::debug;

/// Shown when no editor can be found.
pub const NO_EDITOR_ERR: &str =
    "Couldn't find default editor. Try setting $EDITOR environment variable in ~/.profile";

/// Environment variables checked for an editor, in order.
const EDITOR_VARS: [&str; 2] = ["WRITEAS_EDITOR", "EDITOR"];

/// Editors tried when none is configured.
const FALLBACK_EDITORS: [&str; 2] = ["vim", "nano"];

/// A composed post and the temp file it was written in.
///
/// The file is left on disk so a failed post can be retried; call
/// [`Draft::discard`] once it has been published.
#[derive(Debug)]
pub struct Draft {
    pub path: PathBuf,
    pub contents: String,
}

impl Draft {
    pub fn discard(self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            debug!("Couldn't remove {}: {}", self.path.display(), e);
        }
    }
}

/// Editor from the environment, if set.
pub fn configured_editor<F>(lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    EDITOR_VARS
        .iter()
        .filter_map(|key| lookup(key))
        .find(|v| !v.trim().is_empty())
}

/// Look an executable up on `$PATH`.
fn find_executable(name: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// Command line used to edit `file`.
fn editor_command(file: &Path) -> Option<ProcessCommand> {
    let editor = configured_editor(|key| std::env::var(key).ok()).or_else(|| {
        FALLBACK_EDITORS
            .iter()
            .find_map(|name| find_executable(name))
            .map(|p| p.to_string_lossy().to_string())
    })?;

    // Allow editors configured with arguments, e.g. "code --wait".
    let mut parts = editor.split_whitespace();
    let program = parts.next()?;
    let mut cmd = ProcessCommand::new(program);
    cmd.args(parts).arg(file);
    Some(cmd)
}

/// Open an editor on a fresh temp file and return what the user wrote.
pub fn compose() -> Result<Draft> {
    let (_, path) = tempfile::Builder::new()
        .prefix("WApost")
        .suffix(".txt")
        .tempfile()
        .context("Error creating temp file")?
        .keep()
        .map_err(|e| anyhow!("Error creating temp file: {}", e))?;

    let Some(mut cmd) = editor_command(&path) else {
        let _ = std::fs::remove_file(&path);
        bail!(NO_EDITOR_ERR);
    };

    debug!("Starting editor {:?}", cmd.get_program());
    let status = match cmd.status() {
        Ok(status) => status,
        Err(e) => {
            let _ = std::fs::remove_file(&path);
            return Err(e).context("Error starting editor");
        }
    };
    if !status.success() {
        bail!("Editor finished with error: {}", status);
    }

    let contents = std::fs::read_to_string(&path).context("Error reading post")?;
    Ok(Draft { path, contents })
}

/// How to retry a post whose draft was kept.
pub fn retry_message(path: &Path, bin: &str) -> String {
    if cfg!(windows) {
        format!("To retry this post, run:\n  type {} | {}.exe", path.display(), bin)
    } else {
        format!("To retry this post, run:\n  cat {} | {}", path.display(), bin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_editor_order() {
        let env = |key: &str| match key {
            "WRITEAS_EDITOR" => Some("emacs".to_string()),
            "EDITOR" => Some("vi".to_string()),
            _ => None,
        };
        assert_eq!(configured_editor(env).as_deref(), Some("emacs"));

        let env = |key: &str| match key {
            "WRITEAS_EDITOR" => Some("  ".to_string()),
            "EDITOR" => Some("vi".to_string()),
            _ => None,
        };
        assert_eq!(configured_editor(env).as_deref(), Some("vi"));
        assert_eq!(configured_editor(|_: &str| None), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_retry_message() {
        assert_eq!(
            retry_message(Path::new("/tmp/WApost1.txt"), "writeas"),
            "To retry this post, run:\n  cat /tmp/WApost1.txt | writeas"
        );
    }

    #[test]
    fn test_discard_removes_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("WApost.txt");
        std::fs::write(&path, "draft").unwrap();
        Draft {
            path: path.clone(),
            contents: "draft".to_string(),
        }
        .discard();
        assert!(!path.exists());
    }
}
