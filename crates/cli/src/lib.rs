pub mod commands;
pub mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use shopdesk_core::config::{AppConfig, ConfigOverrides, LoadOptions};

#[derive(Debug, Parser)]
#[command(
    name = "shopdesk",
    about = "Shopdesk conversational retrieval assistant",
    long_about = "Chat with the Shopdesk assistant, query its collections directly, run raw tool calls, and inspect configuration.",
    after_help = "Examples:\n  shopdesk chat --customer-id C0029\n  shopdesk search catalog \"monitor under $300\"\n  shopdesk tool '{\"tool\":\"cancel_order\",\"args\":{\"order_id\":\"O0005\",\"confirm\":true}}'\n  shopdesk config"
)]
pub struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, Default, Args)]
pub struct GlobalArgs {
    #[arg(long, global = true, help = "Path to a shopdesk.toml config file")]
    pub config: Option<PathBuf>,
    #[arg(long, global = true, help = "Directory holding the JSON collections")]
    pub data_dir: Option<PathBuf>,
    #[arg(long, global = true, help = "Customer id bound to the session (e.g. C0029)")]
    pub customer_id: Option<String>,
    #[arg(long, global = true, help = "Submit cancellations and returns without a confirm flag")]
    pub no_confirmation: bool,
}

impl GlobalArgs {
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            config_path: self.config.clone(),
            require_file: self.config.is_some(),
            overrides: ConfigOverrides {
                data_dir: self.data_dir.clone(),
                customer_id: self.customer_id.clone(),
                require_confirmation: self.no_confirmation.then_some(false),
                ..ConfigOverrides::default()
            },
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Start an interactive conversation on stdin/stdout (type quit or exit to end)")]
    Chat,
    #[command(about = "Run one retrieval mode directly and print the ranked results as JSON")]
    Search {
        #[arg(help = "catalog, faq, policy, orders or catalog+faq")]
        mode: String,
        query: String,
        #[arg(short, long, help = "Number of results (clamped to 1..=20)")]
        k: Option<i64>,
    },
    #[command(about = "Normalize and execute a raw JSON tool call")]
    Tool {
        #[arg(help = "Tool call as JSON: {\"tool\": <name>, \"args\": {...}}")]
        request: String,
        #[arg(long, default_value = "", help = "Utterance used to resolve missing identifiers")]
        utterance: String,
    },
    #[command(about = "Inspect effective configuration values with source attribution and redaction")]
    Config,
}

pub async fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = cli.global.load_options();

    let result = match cli.command {
        Command::Chat => match load_config("chat", options) {
            Ok(config) => commands::chat::run(&config).await,
            Err(failure) => failure,
        },
        Command::Search { mode, query, k } => match load_config("search", options) {
            Ok(config) => commands::search::run(&config, &mode, &query, k),
            Err(failure) => failure,
        },
        Command::Tool { request, utterance } => match load_config("tool", options) {
            Ok(config) => commands::tool::run(&config, &request, &utterance),
            Err(failure) => failure,
        },
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run(&options) }
        }
    };

    if !result.output.is_empty() {
        println!("{}", result.output);
    }
    ExitCode::from(result.exit_code)
}

/// Loads config and initializes logging before any command work starts.
fn load_config(command: &str, options: LoadOptions) -> Result<AppConfig, commands::CommandResult> {
    let config = AppConfig::load(options).map_err(|error| {
        commands::CommandResult::failure(
            command,
            "config_validation",
            error.to_string(),
            commands::EXIT_CONFIG,
        )
    })?;
    logging::init_logging(&config);
    Ok(config)
}
