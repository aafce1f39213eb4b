//! writeas - publish to Write.as from the command line.
//!
//! Reads a post from stdin (or an editor, or a file), publishes it and prints
//! the URL. Anonymous posts keep their edit tokens locally.

use std::process::ExitCode;
use writeas::config::Flavor;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    writeas::cli::run(Flavor::Writeas).await
}
