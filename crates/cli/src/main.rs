// dues - plot dues ledger and NOC eligibility from the command line

mod dues;
mod exit_codes;
mod noc;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use plotdues_config::Settings;
use plotdues_io::NormalizeError;
use plotdues_ledger::{FileBackend, LedgerError, LedgerStore};
use plotdues_recon::ReconError;
use tracing::debug;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use exit_codes::{EXIT_ERROR, EXIT_INPUT, EXIT_LEDGER, EXIT_NOT_FOUND, EXIT_SUCCESS, EXIT_USAGE};

const DEFAULT_LOG_FILTER: &str = "plotdues=info";

#[derive(Parser)]
#[command(name = "dues")]
#[command(about = "Plot dues ledger: import society dues sheets, look up balances, check NOC eligibility")]
#[command(version)]
struct Cli {
    /// Config file (TOML)
    #[arg(long, global = true, env = "DUES_CONFIG")]
    config: Option<PathBuf>,

    /// Ledger file, overrides `ledger_path` from the config
    #[arg(long, global = true, env = "DUES_LEDGER")]
    ledger: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a dues sheet and upsert every row by plot number
    #[command(after_help = "\
Examples:
  dues ingest dues-2024.xlsx
  dues ingest export.csv --json

The first row with a cell mentioning both \"plot\" and \"no\" is the header.
Rows without a plot number are skipped.")]
    Ingest {
        /// xlsx, xlsm, xlsb, xls, ods, csv or tsv
        file: PathBuf,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Populate an empty ledger from the seed sheet
    #[command(after_help = "\
Examples:
  dues seed
  dues seed data/dues.xlsx

Does nothing when the ledger already holds records.")]
    Seed {
        /// Sheet to read (default: `seed_path` from the config)
        file: Option<PathBuf>,

        #[arg(long)]
        json: bool,
    },

    /// List records, newest first, or search by plot number
    #[command(after_help = "\
Examples:
  dues list
  dues list --plot b-7 --json")]
    List {
        /// Case-insensitive substring of the plot number
        #[arg(long)]
        plot: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Add or update one record by plot number
    #[command(after_help = "\
Examples:
  dues set --plot B-7 --paid 1000
  dues set '{\"plotNo\": \"B-7\", \"address\": \"Street 4\"}'
  dues set @entry.json --contact 0300-1234567

Only the given fields change. Flags override fields in the JSON payload.")]
    Set(dues::SetArgs),

    /// Delete a record by exact plot number (case-insensitive)
    Delete {
        plot: String,
    },

    /// Check whether a No Objection Certificate can be issued
    #[command(after_help = "\
Examples:
  dues noc B-7
  dues noc b-7 --json

Exit code 0 when dues are fully paid, 6 when a balance remains.")]
    Noc {
        plot: String,

        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = Settings::load(cli.config.as_deref())
        .map_err(|e| CliError::new(EXIT_ERROR, e.to_string()))
        .and_then(|settings| {
            init_tracing(&settings);
            run(cli, settings)
        });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

fn run(cli: Cli, mut settings: Settings) -> Result<u8, CliError> {
    if let Some(ledger) = cli.ledger {
        settings.ledger_path = ledger;
    }
    let store = open_store(&settings)?;

    match cli.command {
        Commands::Ingest { file, json } => dues::cmd_ingest(store, file, json).map(|()| EXIT_SUCCESS),
        Commands::Seed { file, json } => {
            let file = file.unwrap_or_else(|| settings.seed_path.clone());
            dues::cmd_seed(store, file, json).map(|()| EXIT_SUCCESS)
        }
        Commands::List { plot, json } => dues::cmd_list(store, plot, json).map(|()| EXIT_SUCCESS),
        Commands::Set(args) => dues::cmd_set(store, args).map(|()| EXIT_SUCCESS),
        Commands::Delete { plot } => dues::cmd_delete(store, plot).map(|()| EXIT_SUCCESS),
        Commands::Noc { plot, json } => noc::cmd_noc(store, plot, json),
    }
}

fn init_tracing(settings: &Settings) {
    // RUST_LOG wins, then the config file, then the built-in default.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let directive = settings.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER);
        EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    });

    // stdout carries command output; logs go to stderr.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}

fn open_store(settings: &Settings) -> Result<Arc<LedgerStore>, CliError> {
    debug!(path = %settings.ledger_path.display(), "opening ledger");
    LedgerStore::open(FileBackend::new(&settings.ledger_path), settings.store_options())
        .map(Arc::new)
        .map_err(|e| {
            let hint = match e {
                LedgerError::Corrupt(_) => format!(
                    "fix or remove {}, or set on_corrupt = \"reset\" in the config",
                    settings.ledger_path.display()
                ),
                _ => format!("ledger file: {}", settings.ledger_path.display()),
            };
            CliError::from(ReconError::from(e)).with_hint(hint)
        })
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        let message = err.to_string();
        match err {
            ReconError::Normalize(NormalizeError::HeaderNotFound) => CliError::new(EXIT_INPUT, message)
                .with_hint("the sheet needs a header cell like \"Plot No.\""),
            ReconError::Normalize(_) => CliError::new(EXIT_INPUT, message),
            ReconError::Ledger(LedgerError::MissingKey) | ReconError::MissingKey => {
                CliError::usage(message).with_hint("pass --plot or include \"plotNo\" in the payload")
            }
            ReconError::Ledger(_) => CliError::new(EXIT_LEDGER, message),
            ReconError::NotFound(_) => CliError::new(EXIT_NOT_FOUND, message),
            ReconError::InvalidField { .. } => CliError::usage(message),
        }
    }
}
