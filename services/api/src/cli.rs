use crate::browse::{run_browse, BrowseArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use mc_directory::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "MC Directory",
    about = "Serve and browse the wedding MC directory",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Filter and rank listings from the command line, remembering the selection
    Browse(BrowseArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Browse(args) => run_browse(args),
    }
}
