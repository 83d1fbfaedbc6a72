//! Type definitions for floorcalc

mod error;
mod pricing;

pub use error::*;
pub use pricing::*;

/// A fetched CSV row: trimmed cells, position is the schema
pub type Row = Vec<String>;
