//! Event Scraper MCP Server entry point.

use std::sync::Arc;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use event_scraper::renderer::NoopRenderer;
use event_scraper::{AdapterRegistry, EventScraper, ScraperConfig};
use event_scraper_mcp::protocol::ProtocolHandler;
use event_scraper_mcp::tools::ToolRegistry;
use event_scraper_mcp::transport::StdioTransport;

#[derive(Parser)]
#[command(
    name = "event-scraper-mcp",
    about = "MCP server for Event Scraper: structured event data from any event page URL",
    version
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Never launch a browser; pages that need rendering come back as failed.
    #[arg(long, global = true)]
    no_render: bool,

    /// Path to a Chromium/Chrome binary (overrides SCRAPER_CHROMIUM_PATH).
    #[arg(long, global = true)]
    chromium: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start MCP server over stdio (default).
    Serve,

    /// Start MCP server over HTTP.
    #[cfg(feature = "http")]
    ServeHttp {
        /// Listen address (host:port). Defaults to MCP_HOST:MCP_PORT, then 0.0.0.0:8765.
        #[arg(long)]
        addr: Option<String>,

        /// Bearer token for authentication.
        /// Also reads from EVENT_SCRAPER_TOKEN env var.
        #[arg(long)]
        token: Option<String>,
    },

    /// Scrape one URL and print the result as JSON.
    Scrape {
        /// Event page URL.
        url: String,
    },

    /// Print which site adapter matches a URL.
    Detect {
        /// URL to classify.
        url: String,
    },

    /// Print server capabilities as JSON.
    Info,

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   event-scraper-mcp completions bash > ~/.local/share/bash-completion/completions/event-scraper-mcp
    ///   event-scraper-mcp completions zsh > ~/.zfunc/_event-scraper-mcp
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

fn build_scraper(cli: &Cli) -> EventScraper {
    let mut config = ScraperConfig::from_env();
    if let Some(path) = &cli.chromium {
        config.chromium_path = Some(path.clone());
    }

    if cli.no_render {
        EventScraper::with_parts(config, AdapterRegistry::default(), Arc::new(NoopRenderer))
    } else {
        EventScraper::new(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command.as_ref().unwrap_or(&Commands::Serve) {
        Commands::Serve => {
            let scraper = Arc::new(build_scraper(&cli));
            let handler = ProtocolHandler::new(Arc::clone(&scraper));
            let transport = StdioTransport::new(handler);
            transport.run().await?;
            scraper.renderer().shutdown().await?;
        }

        #[cfg(feature = "http")]
        Commands::ServeHttp { addr, token } => {
            use event_scraper_mcp::config::{resolve_listen_addr, resolve_token};
            use event_scraper_mcp::transport::HttpTransport;

            let addr = resolve_listen_addr(addr.as_deref());
            let token = resolve_token(token.clone());

            tracing::info!("Event Scraper MCP server on http://{addr}/mcp");
            if token.is_some() {
                tracing::info!("Auth: bearer token required");
            }

            let scraper = Arc::new(build_scraper(&cli));
            let transport = HttpTransport::new(ProtocolHandler::new(scraper), token);
            transport.run(&addr).await?;
        }

        Commands::Scrape { url } => {
            let scraper = build_scraper(&cli);
            let result = scraper.extract(url).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
            scraper.renderer().shutdown().await?;
            if result.is_failed() {
                std::process::exit(1);
            }
        }

        Commands::Detect { url } => {
            match AdapterRegistry::default().detect(url) {
                Some(adapter) => println!("{adapter}"),
                None => println!("none (generic extraction)"),
            }
        }

        Commands::Info => {
            let capabilities = event_scraper_mcp::types::InitializeResult::default_result();
            let tools = ToolRegistry::list_tools();
            let config = ScraperConfig::from_env();
            let info = serde_json::json!({
                "server": capabilities.server_info,
                "protocol_version": capabilities.protocol_version,
                "capabilities": capabilities.capabilities,
                "tools": tools.iter().map(|t| &t.name).collect::<Vec<_>>(),
                "tool_count": tools.len(),
                "adapters": AdapterRegistry::default()
                    .adapters()
                    .iter()
                    .map(|a| a.id())
                    .collect::<Vec<_>>(),
                "config": config,
                "chromium": event_scraper::renderer::find_chromium(config.chromium_path.as_deref()),
            });
            println!("{}", serde_json::to_string_pretty(&info)?);
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(
                *shell,
                &mut cmd,
                "event-scraper-mcp",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}
