//! Runtime configuration
//!
//! Every setting can come from a flag or from the environment (a `.env`
//! file is loaded first when present).

use std::time::Duration;

use clap::Args;

use crate::services::fetcher::REQUEST_TIMEOUT_SECS;
use crate::services::refresh_cache::CACHE_TTL_SECS;

/// Sheet sources and cache policy
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Published CSV URL of the pricing sheet
    #[arg(long, env = "PRICING_CSV_URL")]
    pub pricing_csv_url: Option<String>,

    /// Published CSV URL of the surcharge settings sheet
    #[arg(long, env = "SETTINGS_CSV_URL")]
    pub settings_csv_url: Option<String>,

    /// Seconds a compiled payload is served before refetching
    #[arg(long, env = "FLOORCALC_CACHE_TTL_SECS", default_value_t = CACHE_TTL_SECS)]
    pub cache_ttl_secs: u64,

    /// Timeout for each sheet request, in seconds
    #[arg(long, env = "FLOORCALC_REQUEST_TIMEOUT_SECS", default_value_t = REQUEST_TIMEOUT_SECS)]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub pricing_csv_url: Option<String>,
    pub settings_csv_url: Option<String>,
    pub cache_ttl: Duration,
    pub request_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            pricing_csv_url: None,
            settings_csv_url: None,
            cache_ttl: Duration::from_secs(CACHE_TTL_SECS),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        }
    }
}

impl From<SourceArgs> for AppConfig {
    fn from(args: SourceArgs) -> Self {
        Self {
            pricing_csv_url: non_blank(args.pricing_csv_url),
            settings_csv_url: non_blank(args.settings_csv_url),
            cache_ttl: Duration::from_secs(args.cache_ttl_secs),
            request_timeout: Duration::from_secs(args.request_timeout_secs),
        }
    }
}

impl AppConfig {
    /// `Cache-Control` value advertised with every payload
    pub fn cache_control(&self) -> String {
        let secs = self.cache_ttl.as_secs();
        format!("s-maxage={secs}, stale-while-revalidate={secs}")
    }
}

/// An exported-but-empty env var counts as unset
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
