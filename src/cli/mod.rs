mod installations;
mod report;

use clap::{Parser, Subcommand};

pub use installations::{InstallationsArgs, RoleArg};
pub use report::ReportArgs;

use crate::context::RunContext;
use crate::observability::init_tracing;
use crate::services::api_client::{ZaptecClient, DEFAULT_BASE_URL};
use crate::types::Result;

/// Generate usage reports from Zaptec chargers
#[derive(Parser)]
#[command(name = "zaptec-reporter")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Fetch and render, but do not write files or send email
    #[arg(long, global = true)]
    dry_run: bool,

    /// Username to access Zaptec Cloud
    #[arg(short, long)]
    username: Option<String>,

    /// Password to access Zaptec Cloud. If no username is provided then the
    /// password is treated as an API access token.
    #[arg(short, long)]
    password: String,

    /// API base URL
    #[arg(long, hide = true, default_value = DEFAULT_BASE_URL)]
    api_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List Zaptec installations
    Installations(InstallationsArgs),

    /// Generate usage report
    Report(ReportArgs),
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        let Cli {
            verbose,
            dry_run,
            username,
            password,
            api_url,
            command,
        } = self;

        let ctx = RunContext::new(verbose, dry_run);
        init_tracing(&ctx);

        match command {
            Commands::Installations(args) => {
                let client = connect(&api_url, username.as_deref(), &password)?;
                args.run(&client)?;
            }
            Commands::Report(args) => {
                // Config problems should surface before we talk to the API
                let email = args.load_email_config()?;
                let client = connect(&api_url, username.as_deref(), &password)?;
                args.run(&ctx, &client, email.as_ref())?;
            }
        }
        Ok(())
    }
}

/// Build the API client; authorize interactively only when a username is given
fn connect(api_url: &str, username: Option<&str>, password: &str) -> Result<ZaptecClient> {
    match username {
        Some(username) => {
            let mut client = ZaptecClient::new(api_url, None)?;
            client.authorize(username, password)?;
            Ok(client)
        }
        None => ZaptecClient::new(api_url, Some(password.to_string())),
    }
}
