//! store-translator CLI - batched mutations and DDL for page-limited record stores.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use store_translator::{
    Command, Config, Cryptor, CryptorImpl, Dataset, DdlEmitter, IdQueryBuilder, InMemoryStore,
    MutationBatcher, Table, TranslateError,
};
use tracing::{info, Level};
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Parser)]
#[command(name = "store-translator")]
#[command(about = "Batched mutations and foreign-table DDL for page-limited record stores")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print CREATE FOREIGN TABLE statements for a table model
    Ddl {
        /// YAML file holding a list of tables
        #[arg(long)]
        schema: PathBuf,
    },

    /// Run a command against an in-memory store and print batch statistics
    Simulate {
        /// YAML file with the records to seed, grouped by table
        #[arg(long)]
        records: PathBuf,

        /// YAML file with the update or delete command
        #[arg(long)]
        command: PathBuf,
    },

    /// Encrypt a value with the configured cipher
    Seal {
        value: String,
    },

    /// Decrypt a sealed value with the configured cipher
    Unseal {
        value: String,
    },

    /// Load and validate the configuration, then print its hash
    CheckConfig,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), TranslateError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format).map_err(TranslateError::Config)?;

    let config = match &cli.config {
        Some(path) => {
            let config = Config::load(path)?;
            info!("Loaded configuration from {:?}", path);
            config
        }
        None => Config::default(),
    };

    match cli.command {
        Commands::Ddl { schema } => {
            let tables: Vec<Table> = read_yaml(&schema)?;
            let ddl = DdlEmitter::new(config.ddl).emit(&tables)?;
            println!("{}", ddl);
        }

        Commands::Simulate { records, command } => {
            let dataset = Dataset::from_yaml(&std::fs::read_to_string(&records)?)?;
            let command: Command = read_yaml(&command)?;
            let limits = config.store.limits()?;

            let store = Arc::new(
                InMemoryStore::new(limits)
                    .with_id_column(config.store.id_column.clone())
                    .with_dataset(dataset),
            );
            store.register_command(&command).await?;

            let batcher =
                MutationBatcher::new(store, limits).with_id_column(config.store.id_column.clone());
            let visitor = IdQueryBuilder::new(&command, batcher.id_column());
            let stats = batcher.execute_with_stats(&command, &visitor).await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }

        Commands::Seal { value } => {
            let cryptor = CryptorImpl::from_config(&config.crypto)?;
            println!("{}", cryptor.seal(&value)?);
        }

        Commands::Unseal { value } => {
            let cryptor = CryptorImpl::from_config(&config.crypto)?;
            println!("{}", cryptor.unseal(&value)?);
        }

        Commands::CheckConfig => {
            config.validate()?;
            println!("Configuration OK");
            println!("  Page size: {}", config.store.page_size);
            println!("  Mutate batch size: {}", config.store.mutate_batch_size);
            println!("  Id column: {}", config.store.id_column);
            println!("  Hash: {}", config.hash());
        }
    }

    Ok(())
}

fn read_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, TranslateError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&content)?)
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Logs go to stderr so stdout carries only command output.
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        "json" => subscriber.json().init(),
        "text" => subscriber.init(),
        other => return Err(format!("unknown log format '{}'", other)),
    }

    Ok(())
}
