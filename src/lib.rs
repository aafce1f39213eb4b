//! Publish text to Write.as and WriteFreely from the command line.
//!
//! The `writeas` and `wf` binaries are thin wrappers around [`cli::run`].

pub mod api;
pub mod cli;
pub mod clipboard;
pub mod commands;
pub mod config;
pub mod context;
pub mod editor;
pub mod fonts;
pub mod prompt;
pub mod protocol;
pub mod store;
pub mod text;
