//! Post appearance values.

use std::fmt;
use tracing::warn;

/// A valid post appearance in the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostFont {
    Normal,
    Sans,
    #[default]
    Mono,
    Wrap,
    Code,
}

impl PostFont {
    /// Value sent as the post's `font`.
    pub fn as_str(self) -> &'static str {
        match self {
            PostFont::Normal => "norm",
            PostFont::Sans => "sans",
            PostFont::Mono => "mono",
            PostFont::Wrap => "wrap",
            PostFont::Code => "code",
        }
    }

    /// Parse a font name, accepting the common aliases.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "norm" | "normal" | "serif" => Some(PostFont::Normal),
            "sans" | "sansserif" => Some(PostFont::Sans),
            "mono" | "monospace" => Some(PostFont::Mono),
            "wrap" => Some(PostFont::Wrap),
            "code" => Some(PostFont::Code),
            _ => None,
        }
    }

    /// Pick the font for a post.
    ///
    /// `--code` wins over any font. Otherwise the flag is used, then the
    /// configured `posts.font`, then the default. Unknown names fall back to
    /// the default with a warning.
    pub fn resolve(code: bool, flag: &str, configured: &str) -> Self {
        let requested = if flag.is_empty() { configured } else { flag };

        if code {
            if !requested.is_empty() && PostFont::parse(requested) != Some(PostFont::default()) {
                warn!(
                    "A non-default font '{}' and --code flag given. 'code' type takes precedence.",
                    requested
                );
            }
            return PostFont::Code;
        }

        if requested.is_empty() {
            return PostFont::default();
        }
        PostFont::parse(requested).unwrap_or_else(|| {
            warn!("Font '{}' invalid. Using default '{}'", requested, PostFont::default());
            PostFont::default()
        })
    }
}

impl fmt::Display for PostFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases() {
        assert_eq!(PostFont::parse("serif"), Some(PostFont::Normal));
        assert_eq!(PostFont::parse("normal"), Some(PostFont::Normal));
        assert_eq!(PostFont::parse("sansserif"), Some(PostFont::Sans));
        assert_eq!(PostFont::parse("Monospace"), Some(PostFont::Mono));
        assert_eq!(PostFont::parse("comic"), None);
    }

    #[test]
    fn test_resolve_order() {
        assert_eq!(PostFont::resolve(false, "", ""), PostFont::Mono);
        assert_eq!(PostFont::resolve(false, "", "sans"), PostFont::Sans);
        assert_eq!(PostFont::resolve(false, "wrap", "sans"), PostFont::Wrap);
        assert_eq!(PostFont::resolve(false, "comic", ""), PostFont::Mono);
    }

    #[test]
    fn test_code_takes_precedence() {
        assert_eq!(PostFont::resolve(true, "sans", ""), PostFont::Code);
        assert_eq!(PostFont::resolve(true, "", "serif"), PostFont::Code);
        assert_eq!(PostFont::Code.to_string(), "code");
    }
}
