//! scout — serve a search agent over the A2A protocol

mod bootstrap;

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tracing::error;

use scout_core::{Credentials, CredentialsError};

use bootstrap::AgentKind;

#[derive(Parser, Debug)]
#[command(name = "scout", version, about = "Serve a search agent over the A2A protocol")]
struct Cli {
    /// Interface to bind
    #[arg(long, default_value = "localhost")]
    host: String,

    /// Port to listen on
    #[arg(long, default_value_t = 30001)]
    port: u16,

    /// Which agent to serve
    #[arg(long, value_enum, default_value_t = AgentKind::Planner)]
    agent: AgentKind,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<CredentialsError>() {
                Some(err) => error!("Error: {}", err),
                None => error!("An error occurred during server startup: {:#}", e),
            }
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let credentials = Credentials::from_env()?;
    if credentials.is_vertex() {
        tracing::info!("Using Vertex AI backend");
    }

    let provider = bootstrap::provider_for(cli.agent, &credentials);
    let server = bootstrap::build_server(cli.agent, &cli.host, cli.port, provider);
    server.start().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_verifies() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["scout"]).unwrap();
        assert_eq!(cli.host, "localhost");
        assert_eq!(cli.port, 30001);
        assert_eq!(cli.agent, AgentKind::Planner);
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::try_parse_from(["scout", "--host", "0.0.0.0", "--port", "9000", "--agent", "search"])
            .unwrap();
        assert_eq!(cli.host, "0.0.0.0");
        assert_eq!(cli.port, 9000);
        assert_eq!(cli.agent, AgentKind::Search);
    }

    #[test]
    fn test_rejects_bad_port() {
        assert!(Cli::try_parse_from(["scout", "--port", "70000"]).is_err());
    }
}
