use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use url::Url;

use catalog_redirect::config::load_config;
use catalog_redirect::http::server::classifier_from_config;
use catalog_redirect::http::RedirectPolicy;
use catalog_redirect::routing::{MatchContext, QueryParams, Router, Targets};

#[derive(Parser)]
#[command(name = "redirect-cli")]
#[command(about = "Inspection CLI for the catalog redirect service", long_about = None)]
struct Cli {
    /// Base URL of a running service
    #[arg(short, long, global = true, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check service status
    Check,
    /// Resolve a legacy URL locally, without a running service
    Resolve {
        /// Full legacy URL, e.g. https://catalog.nypl.org/search/aAuthor
        target: String,

        /// Path to a TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => {
            let res = reqwest::get(format!("{}/check", cli.url.trim_end_matches('/'))).await?;
            print_response(res).await?;
        }
        Commands::Resolve { target, config } => {
            let config = load_config(config.as_deref())?;
            let router = Router::new(&config, classifier_from_config(&config))?;
            let policy = RedirectPolicy::from_config(&config.redirects);

            let parsed = Url::parse(&target)?;
            let host = match (parsed.host_str(), parsed.port()) {
                (Some(host), Some(port)) => format!("{}:{}", host, port),
                (Some(host), None) => host.to_string(),
                (None, _) => return Err(format!("URL has no host: {}", target).into()),
            };
            let ctx = MatchContext::new(
                parsed.path(),
                QueryParams::parse(parsed.query().unwrap_or_default()),
                host,
                parsed.scheme(),
            );

            let resolution = router.route(&ctx).await;
            let status = policy.status_for(resolution.class);
            let report = json!({
                "rule": resolution.rule,
                "class": resolution.class,
                "origin": resolution.origin,
                "status": status.as_u16(),
                "location": Targets::absolute(&resolution.destination, &policy.default_scheme),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: service returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
