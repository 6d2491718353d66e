use clap::{Parser, Subcommand};
use rackline_core::{EntityType, RacklineConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "rackline", version, about = "Rackline change logging and import tools")]
struct Cli {
    /// Path to rackline.yaml. Defaults apply when omitted.
    #[arg(long, short, global = true, env = "RACKLINE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Bulk CSV import tools
    Csv {
        #[command(subcommand)]
        cmd: CsvCommand,
    },

    /// Expand a bracketed name or IP address pattern, e.g. ge-0/0/[0-3]
    Expand {
        pattern: String,

        /// Treat the pattern as an IP address of this family (4 or 6)
        #[arg(long)]
        family: Option<u8>,
    },

    /// Delete change records older than the configured retention
    Housekeeping,

    /// Inspect the persisted change log
    Changelog {
        #[command(subcommand)]
        cmd: ChangelogCommand,
    },

    /// Webhook tools
    Webhooks {
        #[command(subcommand)]
        cmd: WebhooksCommand,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        cmd: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum CsvCommand {
    /// Validate a CSV file against a form declaration
    Validate {
        /// Form declaration (YAML)
        #[arg(long)]
        form: PathBuf,

        /// CSV file to validate
        file: PathBuf,

        /// Print the parsed records as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Print the header line for a form's required columns
    Template {
        #[arg(long)]
        form: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
enum ChangelogCommand {
    /// List change records, oldest first
    List {
        /// Only this object type, e.g. dcim.site
        #[arg(long = "type")]
        object_type: Option<EntityType>,

        /// Only this object id
        #[arg(long)]
        id: Option<u64>,

        /// Only changes made by this user
        #[arg(long)]
        user: Option<String>,

        /// Show at most this many of the newest records
        #[arg(long, short = 'n')]
        limit: Option<usize>,

        /// Also print each changed field
        #[arg(long, default_value_t = false)]
        fields: bool,
    },
}

#[derive(Subcommand, Debug)]
enum WebhooksCommand {
    /// Send a sample notification to a configured webhook
    Test {
        /// Webhook name
        name: String,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load and validate the configuration file
    Check,
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<RacklineConfig> {
    match path {
        Some(path) => Ok(RacklineConfig::from_file(path)?),
        None => Ok(RacklineConfig::default()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // `config check` reports load errors itself, so fall back to defaults here.
    let config = if matches!(cli.cmd, Command::Config { .. }) {
        load_config(cli.config.as_ref()).unwrap_or_default()
    } else {
        load_config(cli.config.as_ref())?
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.cmd {
        Command::Csv { cmd } => match cmd {
            CsvCommand::Validate { form, file, json } => {
                commands::csv::run_validate(&form, &file, json)?
            }
            CsvCommand::Template { form } => commands::csv::run_template(&form)?,
        },

        Command::Expand { pattern, family } => commands::expand::run(&pattern, family)?,

        Command::Housekeeping => {
            commands::housekeeping::run(&config).await?;
        }

        Command::Changelog { cmd } => match cmd {
            ChangelogCommand::List {
                object_type,
                id,
                user,
                limit,
                fields,
            } => {
                let options = commands::changelog::ListOptions {
                    object_type,
                    object_id: id,
                    username: user,
                    limit,
                };
                commands::changelog::run_list(&config, &options, fields).await?
            }
        },

        Command::Webhooks { cmd } => match cmd {
            WebhooksCommand::Test { name } => commands::webhooks::run_test(&config, &name).await?,
        },

        Command::Config { cmd } => match cmd {
            ConfigCommand::Check => match cli.config.as_ref() {
                Some(path) => commands::config::run_check(path)?,
                None => anyhow::bail!("No configuration file given. Use --config or RACKLINE_CONFIG."),
            },
        },
    }

    Ok(())
}
