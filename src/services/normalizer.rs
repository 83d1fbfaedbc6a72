//! Sheet label normalization
//!
//! Maps free-text category and service labels typed into the pricing sheet
//! to the canonical keys used in the payload.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

static SERVICE_SEPARATOR_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s\-/]+").unwrap());

/// Top-level service grouping of a sheet row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Category {
    PolishedConcrete,
    SealedConcrete,
    Epoxy,
    Other,
    /// Normalized label that matched none of the known groups
    Literal(String),
}

impl Category {
    pub fn as_key(&self) -> &str {
        match self {
            Self::PolishedConcrete => "polished_concrete",
            Self::SealedConcrete => "sealed_concrete",
            Self::Epoxy => "epoxy",
            Self::Other => "other",
            Self::Literal(key) => key,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_key())
    }
}

/// Normalize a category label.
///
/// Lowercases, trims and joins words with underscores, then matches by
/// substring in priority order: polish, seal, epoxy, other.
///
/// # Examples
/// ```
/// use floorcalc::services::normalizer::{norm_category, Category};
///
/// assert_eq!(norm_category("POLISHED CONCRETE"), Category::PolishedConcrete);
/// assert_eq!(norm_category("Stamped"), Category::Literal("stamped".into()));
/// ```
pub fn norm_category(raw: &str) -> Category {
    let key = WHITESPACE_RUN
        .replace_all(&raw.trim().to_lowercase(), "_")
        .into_owned();

    if key.contains("polish") {
        Category::PolishedConcrete
    } else if key.contains("seal") {
        Category::SealedConcrete
    } else if key.contains("epoxy") {
        Category::Epoxy
    } else if key.contains("other") {
        Category::Other
    } else {
        Category::Literal(key)
    }
}

/// Normalize an `other` service label.
///
/// Runs of spaces, hyphens and slashes become one underscore; friendly
/// spellings of the three known services collapse to their key. Anything
/// else is returned as-is and will not match a known service downstream.
pub fn norm_service(raw: &str) -> String {
    let key = SERVICE_SEPARATOR_RUN
        .replace_all(&raw.trim().to_lowercase(), "_")
        .into_owned();

    if key.starts_with("micro") || key.contains("topping") {
        "micro_topping".to_string()
    } else if key.starts_with("driveway") {
        "driveway".to_string()
    } else if key.starts_with("terrazzo") {
        "terrazzo".to_string()
    } else {
        key
    }
}
