//! floatchat CLI - ask questions about ocean float data.

use clap::{Parser, Subcommand};
use floatchat::cli;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Get the version string.
///
/// - Release builds (on a git tag): "0.1.0"
/// - Development builds: "0.1.0-dev (abc1234)"
fn version() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("FLOATCHAT_GIT_HASH");
    const IS_RELEASE: &str = env!("FLOATCHAT_IS_RELEASE");

    static VERSION_STRING: std::sync::OnceLock<String> = std::sync::OnceLock::new();

    VERSION_STRING.get_or_init(|| {
        if IS_RELEASE == "true" {
            VERSION.to_string()
        } else {
            format!("{VERSION}-dev ({GIT_HASH})")
        }
    })
}

#[derive(Parser)]
#[command(name = "floatchat")]
#[command(author, version = version(), about = "Chat with ocean float data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a question in the active chat.
    Ask {
        /// The question.
        question: Vec<String>,
    },

    /// Start a new chat and make it active.
    New,

    /// List chats, marking the active one.
    List,

    /// Make another chat active.
    Switch {
        /// Chat ID.
        session_id: String,
    },

    /// Delete the active chat.
    Delete {
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },

    /// Show a chat's conversation.
    Show {
        /// Chat ID. Defaults to the active chat.
        session_id: Option<String>,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("FLOATCHAT_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Ask { question } => cli::ask::run(&question.join(" ")).await,
        Commands::New => cli::session::run_new(),
        Commands::List => cli::list::run(),
        Commands::Switch { session_id } => cli::session::run_switch(&session_id),
        Commands::Delete { yes } => cli::session::run_delete(yes),
        Commands::Show { session_id } => cli::show::run(session_id.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("floatchat: error: {e}");
            ExitCode::FAILURE
        }
    }
}
