//! trustpoll-admin: operator console for the TrustPoll admin dashboard
//!
//! Every invocation logs in, loads the dashboard, runs one command and
//! prints the result.

mod prompt;
mod render;

use std::io;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use trustpoll_admin::{
    AdminConfig, AdminController, AlwaysConfirm, CommandStatus, Confirmer, UNAUTHORIZED_MESSAGE,
};
use trustpoll_client::{Subject, TrustPollClient};

use prompt::TerminalConfirmer;
use render::DashboardText;

#[derive(Parser)]
#[command(name = "trustpoll-admin")]
#[command(about = "Operator console for the TrustPoll admin dashboard")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "trustpoll-admin.toml")]
    config: String,

    /// API origin (overrides config file)
    #[arg(long, env = "TRUSTPOLL_API_URL")]
    api_url: Option<String>,

    /// Identity to log in with; prompted for when absent
    #[arg(long, env = "TRUSTPOLL_ADMIN_IDENTITY")]
    identity: Option<String>,

    /// Answer yes to every confirmation
    #[arg(short, long)]
    yes: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show the dashboard
    Dashboard,

    /// Acknowledge the anomaly flag raised for a subject
    AckFlag {
        /// Email or wallet, per `dashboard.subject_field`
        subject: String,
    },

    /// Block a subject for 30 minutes
    Block {
        /// Email or wallet, per `dashboard.subject_field`
        subject: String,
    },

    /// Add a candidate
    AddCandidate {
        name: String,
    },

    /// Delete a candidate
    DeleteCandidate {
        id: i64,
    },

    /// Make the results public
    Publish,

    /// Hide the results
    Unpublish,

    /// Generate a new fairness report
    Fairness,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so the rendered dashboard stays clean on stdout
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("trustpoll=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let mut config = AdminConfig::load(&cli.config)?;
    if let Some(api_url) = cli.api_url {
        config.api.base_url = api_url;
    }
    info!("API: {}", config.api.base_url);

    let client = TrustPollClient::new(config.client_config())?;
    let confirmer: Arc<dyn Confirmer> = if cli.yes {
        Arc::new(AlwaysConfirm)
    } else {
        Arc::new(TerminalConfirmer)
    };
    let subject_field = config.dashboard.subject_field;
    let controller = AdminController::new(config, Arc::new(client), confirmer);

    let identity = match cli.identity {
        Some(identity) => identity,
        None => prompt::read_line(&mut io::stdin().lock(), &mut io::stdout(), "Admin identity: ")?,
    };

    if !controller.authenticate(&identity).await.granted {
        eprintln!("{UNAUTHORIZED_MESSAGE}");
        std::process::exit(1);
    }

    let outcome = match cli.command {
        Commands::Dashboard => {
            print!("{}", DashboardText(&controller.view().await));
            return Ok(());
        }
        Commands::AckFlag { subject } => {
            controller
                .acknowledge_flag(&Subject::new(subject_field, subject))
                .await
        }
        Commands::Block { subject } => {
            controller
                .block_subject(&Subject::new(subject_field, subject))
                .await
        }
        Commands::AddCandidate { name } => controller.add_candidate(&name).await,
        Commands::DeleteCandidate { id } => controller.delete_candidate(id).await,
        Commands::Publish => controller.publish_results(true).await,
        Commands::Unpublish => controller.publish_results(false).await,
        Commands::Fairness => controller.generate_fairness_report().await,
    };

    println!("{}", render::outcome(&outcome));

    match outcome.status {
        CommandStatus::Applied | CommandStatus::Declined => Ok(()),
        CommandStatus::Failed(_) | CommandStatus::Busy => std::process::exit(1),
    }
}
