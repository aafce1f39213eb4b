//! Command-line interface shared by the `writeas` and `wf` binaries.

use crate::api::PostsApi;
use crate::commands::{self, list::ListOptions, PostOptions};
use crate::config::Flavor;
use crate::context::{ConnectOptions, Context};
use crate::prompt;
use anyhow::Result;
use clap::{Args, CommandFactory, FromArgMatches, Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "Publish text quickly from the command line")]
#[command(long_about = "Publish text quickly from the command line.\n\nWith no command, the post is read from stdin.")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Options for the default action (posting stdin)
    #[command(flatten)]
    pub post: PostOptions,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Flags accepted by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Operate against a custom host
    #[arg(short = 'H', long, global = true, value_name = "HOST")]
    pub host: Option<String>,

    /// Use authenticated user, other than default
    #[arg(short = 'u', long, global = true, value_name = "USER")]
    pub user: Option<String>,

    /// Perform action on Tor hidden service
    #[arg(short = 't', long, global = true)]
    pub tor: bool,

    /// Use a different port to connect to Tor
    #[arg(long, global = true, value_name = "PORT")]
    pub tor_port: Option<u16>,

    /// Use a custom User-Agent
    #[arg(long, global = true, value_name = "UA")]
    pub user_agent: Option<String>,

    /// Make the operation more talkative
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Print full error details and debug logs
    #[arg(long, global = true, env = "WRITEAS_DEBUG")]
    pub debug: bool,
}

impl GlobalArgs {
    fn connect_options(&self) -> ConnectOptions {
        ConnectOptions {
            host: self.host.clone(),
            user: self.user.clone(),
            tor: self.tor,
            tor_port: self.tor_port,
            user_agent: self.user_agent.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Alias for default action: create post from stdin
    Post(PostOptions),
    /// Compose a new post from the command-line and publish
    New(PostOptions),
    /// Publish a file
    Publish {
        /// File to publish
        file: PathBuf,
        #[command(flatten)]
        opts: PostOptions,
    },
    /// Delete a post
    Delete {
        /// ID of the post
        id: String,
        /// Edit token, if the post wasn't created here
        token: Option<String>,
    },
    /// Update (overwrite) a post with text from stdin
    Update {
        /// ID of the post
        id: String,
        /// Edit token, if the post wasn't created here
        token: Option<String>,
        /// Specifies this post is code
        #[arg(long)]
        code: bool,
        /// Change the post's appearance
        #[arg(long, value_name = "FONT")]
        font: Option<String>,
    },
    /// Read a raw post
    Get {
        /// ID of the post
        id: String,
    },
    /// Add an existing post locally
    Add {
        /// ID of the post
        id: String,
        /// Edit token of the post
        token: String,
    },
    /// List all posts
    #[command(visible_alias = "list")]
    Posts(ListOptions),
    /// Authenticate with the service
    Auth {
        /// Username to log in as
        username: Option<String>,
    },
    /// Log out of the service
    Logout,
    /// List blogs
    Blogs {
        /// Show list with URLs
        #[arg(long)]
        url: bool,
    },
    /// Claim local unsynced posts
    Claim,
    /// Fetch authenticated user's posts
    Fetch,
    /// List saved accounts
    Accounts,
}

/// Set up logging on stderr. `RUST_LOG` overrides the flags.
pub fn init_logging(verbose: bool, debug: bool) {
    let level = match (debug, verbose) {
        (true, _) => "debug",
        (false, true) => "info",
        (false, false) => "warn",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("writeas={},reqwest=warn", level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .with_target(false)
        .init();
}

/// Parse arguments, run the command and report errors.
pub async fn run(flavor: Flavor) -> ExitCode {
    let bin = flavor.bin_name();
    let parsed = Cli::command()
        .name(bin)
        .bin_name(bin)
        .try_get_matches()
        .and_then(|matches| Cli::from_arg_matches(&matches));
    let cli = match parsed {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let debug_mode = cli.global.debug;
    init_logging(cli.global.verbose, debug_mode);

    match dispatch(flavor, cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if debug_mode {
                eprintln!("{:?}", e);
            } else {
                eprintln!("{}", e);
            }
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(flavor: Flavor, cli: Cli) -> Result<()> {
    let data_dir = flavor.data_dir()?;
    debug!("Data directory: {}", data_dir.display());
    let mut ctx = Context::load(flavor, &data_dir, cli.global.connect_options())?;
    let client = ctx.client()?;
    run_command(&mut ctx, &client, cli.command, cli.post).await
}

async fn run_command<A: PostsApi + ?Sized>(
    ctx: &mut Context,
    api: &A,
    command: Option<Command>,
    default_opts: PostOptions,
) -> Result<()> {
    let mut stdout = io::stdout();
    let out = &mut stdout;

    match command {
        None => {
            let text = commands::posts::read_stdin()?;
            commands::posts::post(ctx, api, &text, &default_opts, out).await?;
        }
        Some(Command::Post(opts)) => {
            let text = commands::posts::read_stdin()?;
            commands::posts::post(ctx, api, &text, &opts, out).await?;
        }
        Some(Command::New(opts)) => {
            commands::posts::new_post(ctx, api, &opts, out).await?;
        }
        Some(Command::Publish { file, opts }) => {
            commands::posts::publish(ctx, api, &file, &opts, out).await?;
        }
        Some(Command::Delete { id, token }) => {
            commands::posts::delete(ctx, api, &id, token.as_deref()).await?;
        }
        Some(Command::Update { id, token, code, font }) => {
            let text = commands::posts::read_stdin()?;
            let opts = PostOptions {
                code,
                font,
                ..Default::default()
            };
            commands::posts::update(ctx, api, &id, token.as_deref(), &text, &opts).await?;
        }
        Some(Command::Get { id }) => {
            commands::posts::get(ctx, api, &id, out).await?;
        }
        Some(Command::Add { id, token }) => {
            commands::posts::add(ctx, &id, &token)?;
        }
        Some(Command::Posts(opts)) => {
            commands::list::list_posts(ctx, api, &opts, out).await?;
        }
        Some(Command::Auth { username }) => {
            let username = username.unwrap_or_default();
            commands::account::auth(ctx, api, &username, || prompt::password("Password: ")).await?;
        }
        Some(Command::Logout) => {
            commands::account::logout(ctx, api).await?;
        }
        Some(Command::Blogs { url }) => {
            commands::list::list_blogs(ctx, api, url, out).await?;
        }
        Some(Command::Claim) => {
            commands::account::claim(ctx, api, out).await?;
        }
        Some(Command::Fetch) => {
            commands::sync::fetch(ctx, api, prompt::line, out).await?;
        }
        Some(Command::Accounts) => {
            commands::account::accounts(ctx, out)?;
        }
    }

    out.flush()?;
    Ok(())
}
