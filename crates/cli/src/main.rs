mod config_commands;
mod route_commands;

use {
    clap::{Parser, Subcommand},
    tracing::debug,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "beeline", about = "Beeline: route free-text queries to the page you meant")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Custom config directory (overrides default ~/.config/beeline/).
    #[arg(long, global = true, env = "BEELINE_CONFIG_DIR")]
    config_dir: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a query and open every page it commits to.
    Route {
        /// Free text, or a literal http(s) URL.
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
        /// Opaque identifier of the tab or window to navigate.
        #[arg(long)]
        target: Option<String>,
        /// Print committed URLs instead of opening them.
        #[arg(long)]
        dry_run: bool,
    },
    /// Resolve a supported search-results URL to its first result.
    Resolve {
        search_url: String,
        /// Original free text, used for intent detection.
        #[arg(long)]
        text: Option<String>,
    },
    /// Show how a query is rewritten before searching.
    Optimize {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: config_commands::ConfigAction,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    debug!(version = env!("CARGO_PKG_VERSION"), "beeline starting");

    if let Some(ref dir) = cli.config_dir {
        beeline_config::set_config_dir(dir.clone());
    }

    match cli.command {
        Commands::Route {
            text,
            target,
            dry_run,
        } => route_commands::route(&text.join(" "), target.as_deref(), dry_run).await,
        Commands::Resolve { search_url, text } => {
            route_commands::resolve(&search_url, text.as_deref()).await
        },
        Commands::Optimize { text } => route_commands::optimize(&text.join(" ")),
        Commands::Config { action } => config_commands::handle_config(action),
    }
}
