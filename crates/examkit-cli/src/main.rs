//! examkit CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "examkit", version, about = "Exam composition and guided grading")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check exam TOML files for problems
    Validate {
        /// Path to an exam file or directory
        #[arg(long)]
        exam: PathBuf,
    },

    /// Create or update an exam on the backend from a TOML file
    Push {
        /// Exam file
        #[arg(long)]
        exam: PathBuf,

        /// Update this exam instead of the id in the file
        #[arg(long)]
        id: Option<String>,

        /// Bank question ids to append (comma-separated)
        #[arg(long)]
        bank: Option<String>,

        /// Bank owner (defaults to `owner` in the config)
        #[arg(long)]
        owner: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Download an exam into a TOML file
    Pull {
        /// Exam id
        #[arg(long)]
        id: String,

        /// Output file (prints to stdout when omitted)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Delete an exam from the backend
    Delete {
        /// Exam id
        #[arg(long)]
        id: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Work with the question bank
    Bank {
        #[command(subcommand)]
        action: BankAction,
    },

    /// Grade students one at a time, interactively
    Grade {
        /// Grade a local exam file
        #[arg(long, conflicts_with = "id", required_unless_present = "id")]
        exam: Option<PathBuf>,

        /// Grade an exam stored on the backend
        #[arg(long)]
        id: Option<String>,

        /// Directory for grade records (defaults to `results_dir` in the config)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create starter config and example exam
    Init,
}

#[derive(Subcommand)]
enum BankAction {
    /// List the questions in an owner's bank
    List {
        /// Bank owner (defaults to `owner` in the config)
        #[arg(long)]
        owner: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Save one question of an exam file into the bank
    Save {
        /// Exam file
        #[arg(long)]
        exam: PathBuf,

        /// Question number, starting at 1
        #[arg(long)]
        question: usize,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new("examkit_cli=info,examkit_core=info,examkit_client=info")
            }),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { exam } => commands::validate::execute(exam),
        Commands::Push {
            exam,
            id,
            bank,
            owner,
            config,
        } => commands::push::execute(exam, id, bank, owner, config).await,
        Commands::Pull { id, output, config } => commands::pull::execute(id, output, config).await,
        Commands::Delete { id, config } => commands::delete::execute(id, config).await,
        Commands::Bank { action } => match action {
            BankAction::List { owner, config } => commands::bank::list(owner, config).await,
            BankAction::Save {
                exam,
                question,
                config,
            } => commands::bank::save(exam, question, config).await,
        },
        Commands::Grade {
            exam,
            id,
            output,
            config,
        } => commands::grade::execute(exam, id, output, config).await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
