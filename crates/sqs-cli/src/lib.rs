//! # SQS CLI
//!
//! Command-line interface for Amazon Simple Queue Service.
//!
//! This module provides CLI commands for:
//! - Creating, deleting and listing queues
//! - Sending a message read from standard input
//! - Receiving (and optionally deleting) a single message
//!
//! Credentials are read from an INI file with `access_key` and
//! `secret_access_key` entries. `SQS_`-prefixed environment variables override
//! values from the file.

use clap::{Parser, Subcommand};
use serde::Deserialize;
use sqs_client::{Account, Client, ClientConfig, SqsError, API_VERSION};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

/// Visibility timeout, in seconds, used by `receive` unless `--timeout` is given
pub const DEFAULT_RECEIVE_TIMEOUT: i64 = 30;

/// Name of the configuration file inside the configuration directory
pub const CONFIG_FILE_NAME: &str = "sqs.ini";

// ============================================================================
// CLI Structure
// ============================================================================

/// Command-line client for Amazon Simple Queue Service
#[derive(Parser)]
#[command(name = "sqs")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Command-line client for Amazon Simple Queue Service")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "SQS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Logging level, ignored when RUST_LOG is set
    #[arg(short, long, default_value = "warn")]
    pub log_level: String,

    /// Enable JSON logging
    #[arg(long)]
    pub json_logs: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Create a new queue
    Create {
        /// Name of the queue: 1-80 alphanumeric characters, dashes or underscores
        queue_name: String,
    },

    /// Delete a queue and all of its messages
    Delete {
        /// URL of the queue
        queue_url: String,
    },

    /// List queues with their approximate size and visibility timeout
    List {
        /// Only list queues whose names start with this prefix
        prefix: Option<String>,

        /// Omit the table headers
        #[arg(short = 'n', long)]
        no_headers: bool,
    },

    /// Send a message read from standard input
    Send {
        /// URL of the queue
        queue_url: String,
    },

    /// Receive one message and print its body
    Receive {
        /// URL of the queue
        queue_url: String,

        /// Delete the message after receiving it
        #[arg(short, long)]
        delete: bool,

        /// Seconds the message stays hidden from other receivers (0-7200)
        #[arg(
            short,
            long,
            default_value_t = DEFAULT_RECEIVE_TIMEOUT,
            allow_negative_numbers = true
        )]
        timeout: i64,
    },

    /// Show version information
    Version,
}

// ============================================================================
// CLI Error Types
// ============================================================================

/// CLI-specific errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("{0}")]
    Sqs(#[from] SqsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Logging setup failed: {message}")]
    Logging { message: String },

    /// Invalid command line, or a help or version request
    #[error("{0}")]
    Usage(#[from] clap::Error),
}

impl CliError {
    /// Process exit code for this error
    ///
    /// Help and version output count as success. Every other failure exits with 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(e)
                if matches!(
                    e.kind(),
                    clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion
                ) =>
            {
                0
            }
            _ => 1,
        }
    }
}

/// Configuration-related errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file \"{path}\" was not found.")]
    FileNotFound { path: PathBuf },

    #[error("Configuration file \"{path}\" is not readable: {source}")]
    NotReadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Could not parse configuration file \"{path}\": {message}")]
    Parse { path: PathBuf, message: String },

    #[error("No configuration directory is available. Use --config to name a configuration file.")]
    NoConfigDirectory,

    #[error("The \"{key}\" field is missing from the configuration file \"{path}\".")]
    MissingRequired { key: String, path: PathBuf },
}

// ============================================================================
// Configuration Types
// ============================================================================

/// Values read from the configuration file and environment
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CliConfig {
    /// Access key id
    #[serde(default)]
    pub access_key: String,

    /// Secret access key
    #[serde(default)]
    pub secret_access_key: String,

    /// Service endpoint, when not using the default
    pub endpoint: Option<String>,

    /// Maximum number of retries for server errors
    pub max_retries: Option<u32>,
}

impl CliConfig {
    /// Credentials for signing requests
    pub fn account(&self) -> Result<Account, SqsError> {
        Account::new(self.access_key.clone(), self.secret_access_key.clone())
    }

    /// Client configuration with any overrides from the file applied
    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::default();
        if let Some(endpoint) = &self.endpoint {
            config = config.with_endpoint(endpoint.clone());
        }
        if let Some(max_retries) = self.max_retries {
            config = config.with_max_retries(max_retries);
        }
        config
    }
}

/// Default configuration file location, `<config dir>/sqs/sqs.ini`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("sqs").join(CONFIG_FILE_NAME))
}

/// Load configuration from `path`, or from the default location when `None`
pub fn load_configuration(path: Option<&Path>) -> Result<CliConfig, ConfigError> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => default_config_path().ok_or(ConfigError::NoConfigDirectory)?,
    };

    load_configuration_with(&path, config::Environment::with_prefix("SQS"))
}

/// Load configuration from `path` with overrides taken from `environment`
pub fn load_configuration_with(
    path: &Path,
    environment: config::Environment,
) -> Result<CliConfig, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    std::fs::File::open(path).map_err(|source| ConfigError::NotReadable {
        path: path.to_path_buf(),
        source,
    })?;

    let parse_error = |e: config::ConfigError| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let settings = config::Config::builder()
        .add_source(
            config::File::from(path)
                .required(true)
                .format(config::FileFormat::Ini),
        )
        .add_source(environment)
        .build()
        .map_err(parse_error)?;

    let loaded: CliConfig = settings.try_deserialize().map_err(parse_error)?;

    if loaded.access_key.is_empty() {
        return Err(ConfigError::MissingRequired {
            key: "access_key".to_string(),
            path: path.to_path_buf(),
        });
    }
    if loaded.secret_access_key.is_empty() {
        return Err(ConfigError::MissingRequired {
            key: "secret_access_key".to_string(),
            path: path.to_path_buf(),
        });
    }

    debug!(path = %path.display(), "Loaded configuration");
    Ok(loaded)
}

// ============================================================================
// Output Rendering
// ============================================================================

/// One line of the `list` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueRow {
    pub name: String,
    pub messages: String,
    pub timeout: String,
}

fn table_line(name: &str, messages: &str, timeout: &str) -> String {
    format!("{:<55}  {:<10}  {:<10}\n", name, messages, timeout)
}

/// Render queues as a fixed-width table
pub fn render_queue_table(rows: &[QueueRow], headers: bool) -> String {
    let mut output = String::new();
    if headers {
        output.push_str(&table_line("", "ITEMS", "VIS."));
        output.push_str(&table_line("QUEUE NAME", "(APPROX.)", "TIMEOUT"));
    }
    for row in rows {
        output.push_str(&table_line(&row.name, &row.messages, &row.timeout));
    }
    output
}

/// Text printed by the `version` command
pub fn version_text() -> String {
    format!(
        "sqs version {} (API version {})",
        env!("CARGO_PKG_VERSION"),
        API_VERSION
    )
}

// ============================================================================
// Main Entry Point
// ============================================================================

/// Main CLI entry point
pub async fn run_cli() -> Result<(), CliError> {
    let cli = Cli::try_parse()?;

    initialize_logging(&cli)?;

    run(cli).await
}

/// Execute a parsed command line
pub async fn run(cli: Cli) -> Result<(), CliError> {
    if cli.command == Commands::Version {
        println!("{}", version_text());
        return Ok(());
    }

    let config = load_configuration(cli.config.as_deref())?;
    let client = Client::builder(config.account()?)
        .config(config.client_config())
        .build()?;

    match cli.command {
        Commands::Create { queue_name } => execute_create_command(&client, &queue_name).await,
        Commands::Delete { queue_url } => execute_delete_command(&client, &queue_url).await,
        Commands::List { prefix, no_headers } => {
            execute_list_command(&client, prefix.as_deref(), !no_headers).await
        }
        Commands::Send { queue_url } => execute_send_command(&client, &queue_url).await,
        Commands::Receive {
            queue_url,
            delete,
            timeout,
        } => execute_receive_command(&client, &queue_url, delete, timeout).await,
        Commands::Version => Ok(()),
    }
}

/// Initialize logging to stderr based on CLI arguments
pub fn initialize_logging(cli: &Cli) -> Result<(), CliError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .map_err(|e| CliError::Logging {
            message: e.to_string(),
        })?;

    let registry = tracing_subscriber::registry().with(filter);
    let result = if cli.json_logs {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };

    result.map_err(|e| CliError::Logging {
        message: e.to_string(),
    })
}

// ============================================================================
// Command Implementations
// ============================================================================

async fn execute_create_command(client: &Client, name: &str) -> Result<(), CliError> {
    let queue = client.queue_manager().create_queue(name, None).await?;
    info!(queue = %queue, "Created queue");

    println!(
        "New queue has been added. It may take up to 60 seconds for the new queue to \
         appear in the list of queues."
    );
    Ok(())
}

async fn execute_delete_command(client: &Client, url: &str) -> Result<(), CliError> {
    client.queue_manager().delete_queue(url).await?;
    info!(queue = %url, "Deleted queue");

    println!(
        "Queue has been deleted. It may take up to 60 seconds for the queue list to \
         reflect this change."
    );
    Ok(())
}

async fn execute_list_command(
    client: &Client,
    prefix: Option<&str>,
    headers: bool,
) -> Result<(), CliError> {
    let queues = client.queue_manager().list_queues(prefix).await?;

    if queues.is_empty() {
        eprintln!("No queues available.");
        return Ok(());
    }

    // Collect every row first so the table is printed in one piece
    let mut rows = Vec::with_capacity(queues.len());
    for queue in &queues {
        let attributes = queue.get_all_attributes().await?;
        rows.push(QueueRow {
            name: queue.to_string(),
            messages: attributes
                .get("ApproximateNumberOfMessages")
                .unwrap_or_default()
                .to_string(),
            timeout: attributes
                .get("VisibilityTimeout")
                .unwrap_or_default()
                .to_string(),
        });
    }

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(render_queue_table(&rows, headers).as_bytes())?;
    Ok(())
}

async fn execute_send_command(client: &Client, url: &str) -> Result<(), CliError> {
    let mut body = String::new();
    std::io::stdin().read_to_string(&mut body)?;

    let message_id = client.queue(url).send(&body).await?;

    println!("{}", message_id);
    Ok(())
}

async fn execute_receive_command(
    client: &Client,
    url: &str,
    delete: bool,
    timeout: i64,
) -> Result<(), CliError> {
    let queue = client.queue(url);
    let messages = queue.receive(1, Some(timeout)).await?;

    let Some(message) = messages.into_iter().next() else {
        debug!(queue = %url, "No message available");
        return Ok(());
    };

    if delete {
        queue.delete(&message.handle).await?;
    }

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(message.body.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
