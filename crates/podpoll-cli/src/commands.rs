use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use podpoll_engine::{
    Credentials, HttpResourceClient, Identity, NewPoll, Poll, PollStorage, StorageConfig,
    VoteValue,
};

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let storage = open_storage(&cli)?;
    let session = Session {
        storage,
        webid: cli.webid.clone(),
        json: matches!(cli.format, OutputFormat::Json),
    };
    let result = match cli.command {
        Command::Resolve(args) => session.resolve(args).await,
        Command::CreatePoll(args) => session.create_poll(args).await,
        Command::ShowPoll(args) => session.show_poll(args).await,
        Command::ListPolls(args) => session.list_polls(args).await,
        Command::AddStatement(args) => session.add_statement(args).await,
        Command::Vote(args) => session.vote(args).await,
        Command::Participants(args) => session.participants(args).await,
        Command::Statements(args) => session.statements(args).await,
    };
    session.report_diagnostics();
    result
}

fn open_storage(cli: &Cli) -> anyhow::Result<PollStorage> {
    let config = match &cli.config {
        Some(path) => StorageConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => StorageConfig::default(),
    };
    let credentials = match &cli.token {
        Some(token) => Credentials::Bearer(token.clone()),
        None => Credentials::Anonymous,
    };
    let client = HttpResourceClient::new(credentials);
    Ok(PollStorage::with_config(Arc::new(client), config))
}

fn identity(raw: &str) -> anyhow::Result<Identity> {
    Identity::new(raw).with_context(|| format!("invalid WebID {raw:?}"))
}

struct Session {
    storage: PollStorage,
    webid: Option<String>,
    json: bool,
}

impl Session {
    fn me(&self) -> anyhow::Result<Identity> {
        let raw = self
            .webid
            .as_deref()
            .context("this command needs --as <webid> (or PODPOLL_WEBID)")?;
        identity(raw)
    }

    fn emit<T: serde::Serialize>(&self, value: &T) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    async fn resolve(&self, args: ResolveArgs) -> anyhow::Result<()> {
        let who = identity(&args.webid)?;
        let root = self.storage.storage_root(&who).await?;
        if self.json {
            return self.emit(&serde_json::json!({ "webid": who, "storage": root }));
        }
        println!("{} → {}", who.to_string().bold(), root.blue());
        Ok(())
    }

    async fn create_poll(&self, args: CreatePollArgs) -> anyhow::Result<()> {
        let me = self.me()?;
        let poll = self
            .storage
            .create_poll(&me, NewPoll::new(args.title, args.description))
            .await?;
        if self.json {
            return self.emit(&poll);
        }
        println!("{} Poll created", "✓".green().bold());
        print_poll(&poll);
        Ok(())
    }

    async fn show_poll(&self, args: PollRef) -> anyhow::Result<()> {
        let creator = identity(&args.creator)?;
        let id = args.poll;
        match self.storage.get_poll(&creator, &id).await? {
            Some(poll) if self.json => self.emit(&poll),
            Some(poll) => {
                print_poll(&poll);
                Ok(())
            }
            None => anyhow::bail!("poll {id} not found in {creator}'s pod"),
        }
    }

    async fn list_polls(&self, args: ListPollsArgs) -> anyhow::Result<()> {
        let creator = match args.creator {
            Some(raw) => identity(&raw)?,
            None => self.me()?,
        };
        let ids = self.storage.list_polls(&creator).await?;
        if self.json {
            return self.emit(&ids);
        }
        if ids.is_empty() {
            println!("No polls.");
        }
        for id in &ids {
            match self.storage.get_poll(&creator, id).await {
                Ok(Some(poll)) => println!("{}  {}", id.to_string().yellow(), poll.title),
                Ok(None) => println!("{}  {}", id.to_string().yellow(), "(missing)".dimmed()),
                Err(e) => println!("{}  {}", id.to_string().yellow(), e.to_string().red()),
            }
        }
        Ok(())
    }

    async fn add_statement(&self, args: AddStatementArgs) -> anyhow::Result<()> {
        let me = self.me()?;
        let creator = identity(&args.target.creator)?;
        let id = args.target.poll;
        let statement = self
            .storage
            .add_statement(&me, &id, &args.text, args.name.as_deref(), Some(&creator))
            .await?;
        if self.json {
            return self.emit(&statement);
        }
        println!("{} Statement {}", "✓".green().bold(), statement.id.yellow());
        Ok(())
    }

    async fn vote(&self, args: VoteArgs) -> anyhow::Result<()> {
        let me = self.me()?;
        let creator = identity(&args.target.creator)?;
        let id = args.target.poll;
        let value = args.value;
        let vote = self
            .storage
            .add_vote(&me, &id, &args.statement, value, Some(&creator))
            .await?;
        if self.json {
            return self.emit(&vote);
        }
        println!("{} Voted {} on {}", "✓".green().bold(), colored_vote(value), vote.statement_id.yellow());
        Ok(())
    }

    async fn participants(&self, args: PollRef) -> anyhow::Result<()> {
        let creator = identity(&args.creator)?;
        let id = args.poll;
        let participants = self.storage.get_participants(&creator, &id).await?;
        if self.json {
            return self.emit(&participants);
        }
        if participants.is_empty() {
            println!("No participants registered.");
        }
        for participant in &participants {
            let marker = if *participant == creator { " (creator)" } else { "" };
            println!("  {}{}", participant, marker.dimmed());
        }
        Ok(())
    }

    async fn statements(&self, args: PollRef) -> anyhow::Result<()> {
        let creator = identity(&args.creator)?;
        let id = args.poll;
        let viewer = self.webid.as_deref().map(identity).transpose()?;
        let views = self
            .storage
            .statements_with_votes(&creator, &id, viewer.as_ref())
            .await;
        if self.json {
            return self.emit(&views);
        }
        if views.is_empty() {
            println!("No statements.");
        }
        for view in &views {
            let author = view
                .statement
                .author_name
                .clone()
                .unwrap_or_else(|| view.statement.author.to_string());
            println!("{}  {}", view.statement.id.yellow(), view.statement.text.bold());
            println!("  by {}", author.dimmed());
            print!(
                "  {} {}  {} {}  {} {}",
                "agree".green(),
                view.votes.agree,
                "disagree".red(),
                view.votes.disagree,
                "pass".dimmed(),
                view.votes.pass
            );
            match view.user_vote {
                Some(value) => println!("  (you: {})", colored_vote(value)),
                None => println!(),
            }
        }
        Ok(())
    }

    fn report_diagnostics(&self) {
        for diagnostic in self.storage.diagnostics().drain() {
            eprintln!(
                "{} {} failed for {}: {}",
                "warning:".yellow().bold(),
                diagnostic.effect,
                diagnostic.resource,
                diagnostic.message
            );
        }
    }
}

fn print_poll(poll: &Poll) {
    println!("{} {}", poll.id.to_string().yellow().bold(), poll.title.bold());
    if !poll.description.is_empty() {
        println!("  {}", poll.description);
    }
    println!("  Creator: {}", poll.creator.to_string().cyan());
    println!("  Created: {}", poll.created.to_rfc3339());
    if let Some(url) = &poll.participants_url {
        println!("  Participants: {}", url.blue());
    }
}

fn colored_vote(value: VoteValue) -> colored::ColoredString {
    match value {
        VoteValue::Agree => value.as_str().green(),
        VoteValue::Disagree => value.as_str().red(),
        VoteValue::Pass => value.as_str().dimmed(),
    }
}
