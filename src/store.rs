//! Local store of anonymous post edit tokens.
//!
//! One `id|token` line per post in `posts.psv`. Records are appended as posts
//! are created and removed once a post is deleted or claimed by an account.

use crate::config::write_private;
use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name of the store inside the data directory.
pub const POSTS_FILE: &str = "posts.psv";

const SEPARATOR: char = '|';

/// A post created on this machine, with the token needed to edit it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalPost {
    pub id: String,
    pub edit_token: String,
}

/// Handle on `posts.psv`. A missing file is an empty store.
#[derive(Debug, Clone)]
pub struct PostStore {
    path: PathBuf,
}

impl PostStore {
    /// Store kept in the given data directory.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(POSTS_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record a new post.
    pub fn append(&self, id: &str, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).context("Error creating local posts list")?;
        }

        let mut options = std::fs::OpenOptions::new();
        options.append(true).create(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options
            .open(&self.path)
            .context("Error creating local posts list")?;
        writeln!(file, "{}{}{}", id, SEPARATOR, token).context("Error writing to local posts list")?;

        debug!("Stored token for post {}", id);
        Ok(())
    }

    /// Edit token for a post, if it was created here.
    pub fn find(&self, id: &str) -> Result<Option<String>> {
        let prefix = record_prefix(id);
        Ok(self
            .lines()?
            .into_iter()
            .find(|line| line.starts_with(&prefix))
            .map(|line| line[prefix.len()..].split(SEPARATOR).next().unwrap_or_default().to_string()))
    }

    /// Forget a post. Removing an unknown ID does nothing.
    pub fn remove(&self, id: &str) -> Result<()> {
        let prefix = record_prefix(id);
        let lines = self.lines()?;
        let kept: Vec<&String> = lines.iter().filter(|l| !l.starts_with(&prefix)).collect();
        if kept.len() == lines.len() {
            return Ok(());
        }

        let mut out = String::new();
        for line in kept {
            out.push_str(line);
            out.push('\n');
        }
        write_private(&self.path, out.as_bytes())
            .with_context(|| format!("Failed to rewrite {}", self.path.display()))?;

        debug!("Removed post {} from local store", id);
        Ok(())
    }

    /// Every stored post, oldest first. Malformed lines are skipped.
    pub fn list(&self) -> Result<Vec<LocalPost>> {
        Ok(self
            .lines()?
            .iter()
            .filter_map(|line| {
                let mut parts = line.split(SEPARATOR);
                match (parts.next(), parts.next()) {
                    (Some(id), Some(token)) => Some(LocalPost {
                        id: id.to_string(),
                        edit_token: token.to_string(),
                    }),
                    _ => None,
                }
            })
            .collect())
    }

    fn lines(&self) -> Result<Vec<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(contents.lines().map(str::to_string).collect()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", self.path.display())),
        }
    }
}

fn record_prefix(id: &str) -> String {
    format!("{}{}", id, SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, PostStore) {
        let tmp = tempfile::tempdir().unwrap();
        let store = PostStore::in_dir(tmp.path());
        (tmp, store)
    }

    #[test]
    fn test_missing_file_is_empty() {
        let (_tmp, store) = store();
        assert!(store.list().unwrap().is_empty());
        assert_eq!(store.find("abc").unwrap(), None);
        store.remove("abc").unwrap();
        assert!(!store.path().exists());
    }

    #[test]
    fn test_append_and_find() {
        let (_tmp, store) = store();
        store.append("abc", "tok1").unwrap();
        store.append("abcdef", "tok2").unwrap();
        assert_eq!(store.find("abc").unwrap().as_deref(), Some("tok1"));
        assert_eq!(store.find("abcdef").unwrap().as_deref(), Some("tok2"));
        assert_eq!(store.find("ab").unwrap(), None);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let (_tmp, store) = store();
        store.append("abc", "tok1").unwrap();
        store.append("xyz", "tok2").unwrap();

        store.remove("abc").unwrap();
        assert_eq!(store.find("abc").unwrap(), None);
        store.remove("abc").unwrap();

        assert_eq!(
            store.list().unwrap(),
            vec![LocalPost {
                id: "xyz".to_string(),
                edit_token: "tok2".to_string()
            }]
        );
    }

    #[test]
    fn test_remove_only_matches_whole_id() {
        let (_tmp, store) = store();
        store.append("abcdef", "tok").unwrap();
        store.remove("abc").unwrap();
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn test_list_skips_malformed_lines() {
        let (_tmp, store) = store();
        std::fs::write(store.path(), "one|t1\ngarbage\n\ntwo|t2\n").unwrap();
        let ids: Vec<String> = store.list().unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["one", "two"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_created_private() {
        use std::os::unix::fs::PermissionsExt;
        let (_tmp, store) = store();
        store.append("abc", "tok").unwrap();
        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
