//! Command handlers.
//!
//! Handlers are generic over [`PostsApi`](crate::api::PostsApi) and write
//! their normal output to a caller-supplied writer, so they can be driven
//! against a fake client in tests.

pub mod account;
pub mod list;
pub mod posts;
pub mod sync;

use crate::api::ApiError;
use clap::Args;
use std::io::{self, Write};

/// Flags shared by every command that creates a post.
#[derive(Args, Debug, Clone, Default)]
pub struct PostOptions {
    /// Post with a specific appearance: sans, serif, wrap, mono or code
    #[arg(long, value_name = "FONT")]
    pub font: Option<String>,

    /// Language of the post (ISO 639-1 code)
    #[arg(long, value_name = "LANG")]
    pub lang: Option<String>,

    /// Specifies this post is code
    #[arg(long)]
    pub code: bool,

    /// Return the URL for the Markdown version of the post
    #[arg(long)]
    pub md: bool,

    /// Blog to publish on
    #[arg(short = 'c', short_alias = 'b', long = "collection", visible_alias = "blog", value_name = "ALIAS")]
    pub collection: Option<String>,
}

/// Wrap an API failure with a user-facing summary, keeping it as the cause.
pub(crate) fn api_failure(err: ApiError, summary: &str) -> anyhow::Error {
    let message = format!("{}: {}", summary, err);
    anyhow::Error::new(err).context(message)
}

/// Column-aligned text output.
///
/// Each column is as wide as its widest cell plus `padding`, but at least
/// `min_width`. The last cell of a row is never padded.
#[derive(Debug)]
pub(crate) struct Table {
    rows: Vec<Vec<String>>,
    min_width: usize,
    padding: usize,
}

impl Table {
    pub fn new(min_width: usize, padding: usize) -> Self {
        Self {
            rows: Vec::new(),
            min_width,
            padding,
        }
    }

    pub fn row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let columns = self.rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut widths = vec![self.min_width; columns];
        for row in &self.rows {
            // The last cell doesn't count towards alignment.
            for (i, cell) in row.iter().enumerate().take(row.len().saturating_sub(1)) {
                widths[i] = widths[i].max(cell.chars().count() + self.padding);
            }
        }

        for row in &self.rows {
            let mut line = String::new();
            for (i, cell) in row.iter().enumerate() {
                line.push_str(cell);
                if i + 1 < row.len() {
                    let pad = widths[i].saturating_sub(cell.chars().count());
                    line.extend(std::iter::repeat(' ').take(pad));
                }
            }
            writeln!(out, "{}", line.trim_end())?;
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_alignment() {
        let mut table = Table::new(10, 2);
        table.row(["Local", "ID", "Token"]);
        table.row(["unsynced", "averyveryverylongid", "tok"]);
        let mut out = Vec::new();
        table.write_to(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Local     ID                   Token\n\
             unsynced  averyveryverylongid  tok\n"
        );
    }

    #[test]
    fn test_api_failure_message() {
        let err = api_failure(ApiError::RateLimited, "Unable to post");
        assert_eq!(
            err.to_string(),
            "Unable to post: Too many requests in a short period of time. Try again later."
        );
        assert!(err.downcast_ref::<ApiError>().is_some());
    }
}
