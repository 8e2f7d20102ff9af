use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use flowgate_chat_sdk::ChatClient;
use flowgate_cli::{run_cli, CliError};
use flowgate_core::{
    ChatCollaborator, FlowConfig, HttpCollaborator, Orchestrator, SimulatedCollaborator,
};

#[derive(Parser, Debug)]
#[command(name = "flowgate")]
#[command(about = "Drive and watch delegated-authorization flows from the terminal", long_about = None)]
struct Cli {
    /// Use the offline simulated backend instead of the chat API
    #[arg(long, env = "FLOWGATE_SIMULATE")]
    simulate: bool,

    /// Base URL of the chat API
    #[arg(long, env = "FLOWGATE_API_URL", default_value = "http://localhost:8000")]
    api_url: String,

    /// Request timeout for the chat API, in seconds
    #[arg(long, env = "FLOWGATE_API_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    /// Identity token to sign in with at startup
    #[arg(long, env = "FLOWGATE_ID_TOKEN", hide_env_values = true)]
    id_token: Option<String>,

    /// Delay between flow steps, in milliseconds
    #[arg(long)]
    step_interval_ms: Option<u64>,
}

impl Cli {
    fn collaborator(&self) -> Result<Arc<dyn ChatCollaborator>, CliError> {
        if self.simulate {
            return Ok(Arc::new(SimulatedCollaborator::new()));
        }
        let client = ChatClient::builder()
            .base_url(&self.api_url)
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()?;
        Ok(Arc::new(HttpCollaborator::with_client(client)))
    }

    fn config(&self) -> Result<FlowConfig, CliError> {
        let mut config = FlowConfig::from_env()?;
        if let Some(ms) = self.step_interval_ms {
            config = FlowConfig::builder()
                .pacing(Duration::from_millis(ms))
                .step_set(config.step_set().clone())
                .requested_scope(config.requested_scope())
                .build();
        }
        Ok(config)
    }
}

fn init_logging() {
    // Logs go to stderr so they never interleave with the REPL on stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    init_logging();

    let orchestrator = Orchestrator::from_arc(cli.collaborator()?, cli.config()?);
    if let Some(token) = cli.id_token.as_deref().filter(|t| !t.trim().is_empty()) {
        orchestrator.login(token.trim())?;
    }

    run_cli(orchestrator).await
}
