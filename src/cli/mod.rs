use std::sync::Arc;

use actix_web::web;
use anyhow::bail;
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use crate::config::{AppConfig, SourceArgs};
use crate::server::start_server;
use crate::services::{schema, HttpCsvSource, PricingService};
use crate::types::{OtherService, Payload};

/// Default listen address for `serve`
pub const DEFAULT_BIND: &str = "0.0.0.0:3000";

/// Concrete flooring pricing endpoint
#[derive(Parser)]
#[command(name = "floorcalc")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    sources: SourceArgs,

    #[command(flatten)]
    serve: ServeArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Address the HTTP server listens on
    #[arg(long, env = "FLOORCALC_BIND", default_value = DEFAULT_BIND)]
    bind: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the pricing endpoint (default)
    Serve,

    /// Compile the sheets once and print the payload
    Fetch {
        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Compile the sheets once and report data problems
    Check,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        schema::validate_all()?;

        let config = AppConfig::from(self.sources);
        let source = Arc::new(HttpCsvSource::new(config.request_timeout)?);
        let service = PricingService::new(config, source);

        match self.command {
            None | Some(Commands::Serve) => serve(service, &self.serve.bind).await,
            Some(Commands::Fetch { pretty }) => {
                let payload = service.compile_fresh().await?;
                let json = if pretty {
                    serde_json::to_string_pretty(&payload)?
                } else {
                    serde_json::to_string(&payload)?
                };
                println!("{}", json);
                Ok(())
            }
            Some(Commands::Check) => {
                let payload = service.compile_fresh().await?;
                print!("{}", check_report(&payload));
                let rejected = payload.diagnostics.rejected_rows.len();
                if rejected > 0 {
                    bail!("{} sheet row(s) rejected", rejected);
                }
                Ok(())
            }
        }
    }
}

async fn serve(service: PricingService, bind: &str) -> anyhow::Result<()> {
    let config = service.config();
    match &config.pricing_csv_url {
        Some(url) => info!(pricing = %url, settings = ?config.settings_csv_url, "pricing sources configured"),
        None => warn!("PRICING_CSV_URL not set; pricing requests will fail until it is"),
    }

    start_server(web::Data::new(service), bind)?.await?;
    Ok(())
}

/// Human-readable summary for `floorcalc check`
fn check_report(payload: &Payload) -> String {
    let mut out = String::new();

    out.push_str("Tiers per category:\n");
    for (category, tiers) in payload.ranges.iter() {
        out.push_str(&format!("  {:<20} {}\n", category, tiers.len()));
    }

    let other = &payload.pricing.other;
    let services: Vec<String> = OtherService::ALL
        .iter()
        .map(|service| format!("{}={}", service.as_key(), other.service(*service).len()))
        .collect();
    out.push_str(&format!("Other services: {}\n", services.join(" ")));

    out.push_str(&format!("Settings: {}\n", payload.settings.len()));

    if let Some(err) = &payload.diagnostics.settings_error {
        out.push_str(&format!("Settings sheet unavailable: {}\n", err));
    }
    for issue in &payload.diagnostics.rejected_rows {
        out.push_str(&format!(
            "Rejected {} row {}: {}\n",
            issue.sheet, issue.row, issue.reason
        ));
    }

    out
}
