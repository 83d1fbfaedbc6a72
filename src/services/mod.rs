//! Services that fetch, compile and cache pricing data

pub mod compiler;
pub mod fetcher;
pub mod normalizer;
pub mod pricing;
pub mod refresh_cache;
pub mod schema;
pub mod settings;

#[cfg(test)]
pub(crate) mod testing;

pub use compiler::{compile, Compiled};
pub use fetcher::{fetch_csv, parse_rows, CsvSource, HttpCsvSource};
pub use normalizer::{norm_category, norm_service, Category};
pub use pricing::{PayloadLookup, PricingService};
pub use refresh_cache::{CacheSnapshot, CacheStatus, RefreshCache};
pub use settings::load_settings;
