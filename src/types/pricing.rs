//! Pricing payload types served to the calculator front-end

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sentinel lower bound when a sheet row leaves `min` blank
pub const DEFAULT_RANGE_MIN: f64 = 0.0;

/// Sentinel upper bound when a sheet row leaves `max` blank
pub const DEFAULT_RANGE_MAX: f64 = 999_999.0;

/// Square-footage band a tier applies to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

impl Default for PriceRange {
    fn default() -> Self {
        Self {
            min: DEFAULT_RANGE_MIN,
            max: DEFAULT_RANGE_MAX,
        }
    }
}

/// Polished concrete tier: one price per finishing grit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PolishedTier {
    #[serde(flatten)]
    pub range: PriceRange,
    pub grit_200: f64,
    pub grit_400: f64,
    pub grit_800: f64,
    pub grit_1800: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SealedTier {
    #[serde(flatten)]
    pub range: PriceRange,
    pub base: f64,
}

/// Epoxy tier: one price per coating system
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EpoxyTier {
    #[serde(flatten)]
    pub range: PriceRange,
    pub single: f64,
    pub metallic: f64,
    pub quartz: f64,
    pub flake: f64,
}

/// The fixed set of services priced under the `other` category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtherService {
    MicroTopping,
    Driveway,
    Terrazzo,
}

impl OtherService {
    pub const ALL: [Self; 3] = [Self::MicroTopping, Self::Driveway, Self::Terrazzo];

    /// Look up a normalized service key; anything outside the known three is `None`
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "micro_topping" => Some(Self::MicroTopping),
            "driveway" => Some(Self::Driveway),
            "terrazzo" => Some(Self::Terrazzo),
            _ => None,
        }
    }

    pub fn as_key(&self) -> &'static str {
        match self {
            Self::MicroTopping => "micro_topping",
            Self::Driveway => "driveway",
            Self::Terrazzo => "terrazzo",
        }
    }
}

/// Flat per-tier prices for the `other` services
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OtherPricing {
    pub micro_topping: BTreeMap<String, f64>,
    pub driveway: BTreeMap<String, f64>,
    pub terrazzo: BTreeMap<String, f64>,
}

impl OtherPricing {
    pub fn service(&self, service: OtherService) -> &BTreeMap<String, f64> {
        match service {
            OtherService::MicroTopping => &self.micro_topping,
            OtherService::Driveway => &self.driveway,
            OtherService::Terrazzo => &self.terrazzo,
        }
    }

    pub fn service_mut(&mut self, service: OtherService) -> &mut BTreeMap<String, f64> {
        match service {
            OtherService::MicroTopping => &mut self.micro_topping,
            OtherService::Driveway => &mut self.driveway,
            OtherService::Terrazzo => &mut self.terrazzo,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Pricing {
    pub polished_concrete: BTreeMap<String, PolishedTier>,
    pub sealed_concrete: BTreeMap<String, SealedTier>,
    pub epoxy: BTreeMap<String, EpoxyTier>,
    pub other: OtherPricing,
}

/// Category key → tier → range.
///
/// Always carries the four known buckets; categories the normalizer passes
/// through verbatim get a bucket the first time they appear.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Ranges(BTreeMap<String, BTreeMap<String, PriceRange>>);

impl Ranges {
    pub const KNOWN_CATEGORIES: [&'static str; 4] =
        ["polished_concrete", "sealed_concrete", "epoxy", "other"];

    pub fn new() -> Self {
        Self(
            Self::KNOWN_CATEGORIES
                .iter()
                .map(|c| (c.to_string(), BTreeMap::new()))
                .collect(),
        )
    }

    pub fn record(&mut self, category: &str, tier: &str, range: PriceRange) {
        self.0
            .entry(category.to_string())
            .or_default()
            .insert(tier.to_string(), range);
    }

    pub fn category(&self, category: &str) -> Option<&BTreeMap<String, PriceRange>> {
        self.0.get(category)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeMap<String, PriceRange>)> {
        self.0.iter()
    }
}

impl Default for Ranges {
    fn default() -> Self {
        Self::new()
    }
}

/// Surcharge settings (stain add-ons, cove base per linear foot, ...)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Settings(BTreeMap<String, f64>);

impl Settings {
    pub fn get(&self, key: &str) -> Option<f64> {
        self.0.get(key).copied()
    }

    pub fn set(&mut self, key: impl Into<String>, value: f64) {
        self.0.insert(key.into(), value);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for Settings {
    fn default() -> Self {
        let mut settings = BTreeMap::new();
        settings.insert("stain_polished".to_string(), 500.0);
        settings.insert("stain_sealed".to_string(), 300.0);
        settings.insert("integral_cove_per_lf".to_string(), 15.0);
        Self(settings)
    }
}

/// A sheet row that was read but refused
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RowIssue {
    /// Which sheet the row came from ("pricing" or "settings")
    pub sheet: String,
    /// 1-based row number in the fetched sheet, header included
    pub row: usize,
    pub reason: String,
}

/// Data-quality problems found while building a payload
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Diagnostics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings_error: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rejected_rows: Vec<RowIssue>,
}

impl Diagnostics {
    pub fn is_empty(&self) -> bool {
        self.settings_error.is_none() && self.rejected_rows.is_empty()
    }

    pub fn merge(&mut self, other: Diagnostics) {
        if other.settings_error.is_some() {
            self.settings_error = other.settings_error;
        }
        self.rejected_rows.extend(other.rejected_rows);
    }
}

/// Full response body for the pricing endpoint; the unit the cache stores
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Payload {
    pub pricing: Pricing,
    pub ranges: Ranges,
    pub settings: Settings,
    #[serde(default, skip_serializing_if = "Diagnostics::is_empty")]
    pub diagnostics: Diagnostics,
}
