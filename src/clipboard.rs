//! Copy text to the system clipboard.

use anyhow::{anyhow, Result};
use copypasta::{ClipboardContext, ClipboardProvider};

/// Put `text` on the clipboard.
pub fn copy(text: &str) -> Result<()> {
    let mut clipboard =
        ClipboardContext::new().map_err(|err| anyhow!("open clipboard: {}", err))?;
    clipboard
        .set_contents(text.to_owned())
        .map_err(|err| anyhow!("set clipboard contents: {}", err))
}
