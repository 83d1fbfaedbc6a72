//! Pricing service
//!
//! Runs the full pipeline behind the refresh cache: fetch the pricing
//! sheet, compile it, overlay settings, cache the payload.

use std::sync::Arc;

use tracing::instrument;

use super::compiler::compile;
use super::fetcher::{fetch_csv, CsvSource};
use super::refresh_cache::{CacheSnapshot, CacheStatus, RefreshCache};
use super::settings::load_settings;
use crate::config::AppConfig;
use crate::types::{Diagnostics, FloorcalcError, Payload, Result};

/// Payload plus how the cache produced it
#[derive(Debug, Clone)]
pub struct PayloadLookup {
    pub payload: Arc<Payload>,
    pub status: CacheStatus,
}

pub struct PricingService {
    config: AppConfig,
    source: Arc<dyn CsvSource>,
    cache: RefreshCache,
}

impl PricingService {
    pub fn new(config: AppConfig, source: Arc<dyn CsvSource>) -> Self {
        let cache = RefreshCache::new(config.cache_ttl);
        Self {
            config,
            source,
            cache,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Cached payload, refreshed when older than the TTL
    pub async fn payload(&self) -> Result<PayloadLookup> {
        let url = self.pricing_url()?;
        let (payload, status) = self
            .cache
            .get_or_refresh(url, || self.build_payload(url))
            .await?;
        Ok(PayloadLookup { payload, status })
    }

    /// Build a payload straight from the sheets, bypassing the cache
    pub async fn compile_fresh(&self) -> Result<Payload> {
        let url = self.pricing_url()?;
        self.build_payload(url).await
    }

    pub async fn cache_snapshot(&self) -> Option<CacheSnapshot> {
        self.cache.snapshot().await
    }

    fn pricing_url(&self) -> Result<&str> {
        self.config
            .pricing_csv_url
            .as_deref()
            .ok_or_else(|| FloorcalcError::Config("PRICING_CSV_URL not set".into()))
    }

    #[instrument(skip(self))]
    async fn build_payload(&self, url: &str) -> Result<Payload> {
        let rows = fetch_csv(self.source.as_ref(), url).await?;
        if rows.is_empty() {
            return Err(FloorcalcError::EmptyData(
                "Pricing CSV returned no rows".into(),
            ));
        }

        let compiled = compile(&rows);

        // Settings only after pricing compiled cleanly
        let (settings, settings_diagnostics) = load_settings(
            self.source.as_ref(),
            self.config.settings_csv_url.as_deref(),
        )
        .await;

        let mut diagnostics = Diagnostics {
            settings_error: None,
            rejected_rows: compiled.rejected_rows,
        };
        diagnostics.merge(settings_diagnostics);

        Ok(Payload {
            pricing: compiled.pricing,
            ranges: compiled.ranges,
            settings,
            diagnostics,
        })
    }
}
