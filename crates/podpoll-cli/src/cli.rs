use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use podpoll_types::{PollId, VoteValue};

#[derive(Parser)]
#[command(
    name = "podpoll",
    about = "Deliberation polls stored in participants' own pods",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Storage layout and provider rules (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Bearer token for authenticated requests
    #[arg(long, global = true, env = "PODPOLL_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// WebID to act as
    #[arg(long = "as", global = true, env = "PODPOLL_WEBID")]
    pub webid: Option<String>,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the storage root an identity resolves to
    Resolve(ResolveArgs),
    /// Create a poll in your pod
    CreatePoll(CreatePollArgs),
    /// Show poll metadata
    ShowPoll(PollRef),
    /// List polls created by an identity
    ListPolls(ListPollsArgs),
    /// Add a statement to a poll
    AddStatement(AddStatementArgs),
    /// Vote on a statement
    Vote(VoteArgs),
    /// List registered participants
    Participants(PollRef),
    /// Show all statements with vote tallies
    Statements(PollRef),
}

#[derive(Args)]
pub struct ResolveArgs {
    pub webid: String,
}

#[derive(Args)]
pub struct CreatePollArgs {
    pub title: String,
    #[arg(short, long, default_value = "")]
    pub description: String,
}

#[derive(Args)]
pub struct PollRef {
    /// WebID of the poll creator
    pub creator: String,
    pub poll: PollId,
}

#[derive(Args)]
pub struct ListPollsArgs {
    /// Defaults to the acting identity
    pub creator: Option<String>,
}

#[derive(Args)]
pub struct AddStatementArgs {
    #[command(flatten)]
    pub target: PollRef,
    pub text: String,
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Args)]
pub struct VoteArgs {
    #[command(flatten)]
    pub target: PollRef,
    pub statement: String,
    /// agree, disagree or pass
    pub value: VoteValue,
}
