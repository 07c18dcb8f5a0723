//! committy - CLI entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow};
use clap::{ArgAction, Parser};
use tracing_subscriber::EnvFilter;

use committy::config::{self, CliOverrides, MessageFormat, Settings};
use committy::diff::parse_diff;
use committy::error::{ConfigError, InteractiveError, PipelineError};
use committy::git::{GitRepository, VersionControl};
use committy::interactive::{self, ReviewChoice};
use committy::llm::{ModelClient, OllamaClient};
use committy::pipeline::{self, CommitOutcome, Decision, GeneratedMessage};

/// Propose a conventional commit message for the staged changes using a local model.
#[derive(Parser, Debug)]
#[command(name = "committy")]
#[command(about = "Generate conventional commit messages for staged changes with a local Ollama model")]
#[command(version)]
struct Cli {
    /// Print the message without committing
    #[arg(long)]
    dry_run: bool,

    /// Ollama model to use
    #[arg(short, long)]
    model: Option<String>,

    /// Message style
    #[arg(short, long, value_enum)]
    format: Option<MessageFormat>,

    /// Open the message in an editor before reviewing it
    #[arg(short, long)]
    edit: bool,

    /// Config file to read instead of the default location
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write a commented default config file and exit
    #[arg(long)]
    init_config: bool,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Commit without asking for confirmation
    #[arg(short = 'y', long)]
    no_confirm: bool,

    /// Require a scope, inferring one from the paths when the model omits it
    #[arg(long, conflicts_with = "no_scope")]
    with_scope: bool,

    /// Leave the scope to the model
    #[arg(long)]
    no_scope: bool,

    /// Maximum tokens to generate
    #[arg(long)]
    max_tokens: Option<u32>,

    /// Sampling temperature
    #[arg(long)]
    temperature: Option<f32>,

    /// Seconds to wait for the model
    #[arg(long)]
    timeout: Option<u64>,

    /// Ollama server address
    #[arg(long)]
    host: Option<String>,

    /// Show the staged changes and their classification without calling the model
    #[arg(long)]
    analyze: bool,

    /// List the models available on the Ollama server and exit
    #[arg(long)]
    list_models: bool,

    /// Stage all changes before generating
    #[arg(short, long)]
    all: bool,
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        let with_scope = if self.with_scope {
            Some(true)
        } else if self.no_scope {
            Some(false)
        } else {
            None
        };
        CliOverrides {
            model: self.model.clone(),
            format: self.format,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            timeout: self.timeout,
            host: self.host.clone(),
            with_scope,
            no_confirm: self.no_confirm.then_some(true),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            eprintln!("No commit was created.");
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` wins; otherwise `-v` raises the crate's level. Logs go to stderr.
fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("committy={}", level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    if cli.init_config {
        let path = cli
            .config
            .clone()
            .or_else(config::default_config_path)
            .ok_or(ConfigError::NoConfigDir)?;
        config::write_default_config(&path)?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    let settings = config::resolve(cli.config.as_deref(), &cli.overrides())
        .context("Invalid configuration")?;

    if cli.list_models {
        let client = OllamaClient::new(&settings.host, settings.timeout)?;
        return list_models(&client, &settings).await;
    }

    let repo = GitRepository::discover(".")
        .context("Not a git repository. Run committy from within a git repository.")?;

    if cli.all {
        repo.stage_all()?;
    }

    let diff = repo.staged_diff()?;
    let summary = parse_diff(&diff);

    if cli.analyze {
        println!("{}", pipeline::analysis_report(&summary));
        return Ok(());
    }

    let client = OllamaClient::new(&settings.host, settings.timeout)?;
    eprintln!("Generating commit message with {}...", settings.model);

    let review = |generated: GeneratedMessage| -> Result<Decision, PipelineError> {
        report_notes(&generated);
        if cli.dry_run {
            println!("{}", generated.message);
            return Ok(Decision::Abort);
        }
        review_message(generated.message, cli.edit, &settings)
    };
    let outcome = tokio::select! {
        result = pipeline::generate_and_commit(&repo, &summary, &settings, &client, review) => result?,
        _ = tokio::signal::ctrl_c() => return Err(anyhow!("Interrupted")),
    };

    match outcome {
        CommitOutcome::Committed(id) => println!("Created commit {}", &id[..id.len().min(7)]),
        CommitOutcome::Aborted if cli.dry_run => {}
        CommitOutcome::Aborted => println!("Aborted. No commit was created."),
    }
    Ok(())
}

/// Optional editor pass, then the accept/edit/reject loop.
fn review_message(
    mut message: String,
    edit_first: bool,
    settings: &Settings,
) -> Result<Decision, PipelineError> {
    if edit_first {
        match edit_step(&message, settings)? {
            Some(edited) => message = edited,
            None => return Ok(Decision::Abort),
        }
    }

    if !settings.no_confirm {
        loop {
            println!("\n{}\n", message);
            match interactive::prompt_review()? {
                ReviewChoice::Accept => break,
                ReviewChoice::Edit => match edit_step(&message, settings)? {
                    Some(edited) => message = edited,
                    None => return Ok(Decision::Abort),
                },
                ReviewChoice::Reject => return Ok(Decision::Abort),
            }
        }
    }
    Ok(Decision::Commit(message))
}

async fn list_models(client: &OllamaClient, settings: &Settings) -> Result<()> {
    let models = client.list_models().await?;
    if models.is_empty() {
        println!("No models installed. Pull one with 'ollama pull {}'.", settings.model);
        return Ok(());
    }
    for model in models {
        let marker = if model.name == settings.model { "*" } else { " " };
        match model.size {
            Some(bytes) => println!(
                "{} {} ({:.1} GB)",
                marker,
                model.name,
                bytes as f64 / 1_000_000_000.0
            ),
            None => println!("{} {}", marker, model.name),
        }
    }
    Ok(())
}

fn report_notes(generated: &GeneratedMessage) {
    if generated.fallback {
        eprintln!("Note: the model did not answer in conventional format; its text was kept as a chore message.");
    }
    if let Some(truncation) = &generated.truncation {
        eprintln!(
            "Note: the diff was shortened to fit the prompt ({} files cut, {} omitted).",
            truncation.truncated_files.len(),
            truncation.dropped_files.len()
        );
    }
    if generated.description_truncated {
        eprintln!("Note: the description was shortened to 72 characters.");
    }
}

/// Edit `message` and re-validate it. `None` when the user emptied it.
fn edit_step(message: &str, settings: &Settings) -> Result<Option<String>, InteractiveError> {
    let editor = interactive::resolve_editor(settings.editor.as_deref())?;
    let edited = interactive::edit_message(message, &editor)?;
    if edited.is_empty() {
        return Ok(None);
    }

    let reviewed = pipeline::review_edited(&edited);
    if reviewed.repaired {
        eprintln!("Fixed the formatting of the edited message.");
    }
    if !reviewed.violations.is_empty() {
        eprintln!("The edited message does not follow the conventional format:");
        for violation in &reviewed.violations {
            eprintln!("  - {}", violation);
        }
        if !interactive::confirm("Use it anyway?", false)? {
            return Ok(Some(message.to_string()));
        }
    }
    Ok(Some(reviewed.message))
}
