//! wf - publish to a WriteFreely instance from the command line.
//!
//! Same commands as `writeas`, but every post belongs to a logged-in account.

use std::process::ExitCode;
use writeas::config::Flavor;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    writeas::cli::run(Flavor::WriteFreely).await
}
