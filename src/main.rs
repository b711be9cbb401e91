use std::path::PathBuf;

use clap::Parser;

use agentops_mcp::config::load_config;
use agentops_mcp::observability::init_logging;
use agentops_mcp::server::run_server;

/// Provide MCP tools for interacting with the AgentOps API.
#[derive(Debug, Parser)]
#[command(name = "agentops-mcp", version, about)]
struct Cli {
    /// Base URL for AgentOps API (default: https://api.agentops.ai).
    /// Tool calls can still override it with AGENTOPS_API_URL.
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// YAML config file (default: platform config dir, if present).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Timeout for each upstream HTTP request, in seconds.
    #[arg(long, value_name = "SECS")]
    timeout_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(url) = cli.api_url {
        config.api_url = url;
    }
    if let Some(secs) = cli.timeout_secs {
        config.request_timeout_secs = secs;
    }
    config.validate()?;

    run_server(config).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_parse() {
        let cli = Cli::parse_from([
            "agentops-mcp",
            "--api-url",
            "http://localhost:8000",
            "--timeout-secs",
            "10",
        ]);
        assert_eq!(cli.api_url.as_deref(), Some("http://localhost:8000"));
        assert_eq!(cli.timeout_secs, Some(10));
        assert!(cli.config.is_none());
    }

    #[test]
    fn no_flags_is_allowed() {
        let cli = Cli::parse_from(["agentops-mcp"]);
        assert!(cli.api_url.is_none());
    }
}
