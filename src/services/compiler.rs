//! Pricing sheet compiler
//!
//! Turns fetched pricing rows into the nested `pricing` / `ranges`
//! structures. Rows missing a category or tier, and `other` rows naming an
//! unknown service, are dropped quietly. Rows with unreadable numbers are
//! dropped too but reported back so they show up in diagnostics.

use tracing::{debug, warn};

use super::normalizer::{norm_category, norm_service, Category};
use super::schema::{pricing as col, PRICING};
use crate::types::{
    EpoxyTier, OtherService, PolishedTier, PriceRange, Pricing, Ranges, Result, Row, RowIssue,
    SealedTier,
};

/// Output of one compile pass
#[derive(Debug, Clone, Default)]
pub struct Compiled {
    pub pricing: Pricing,
    pub ranges: Ranges,
    pub rejected_rows: Vec<RowIssue>,
}

/// Per-category numbers read from one row
enum TierPrices {
    Polished {
        grit_200: f64,
        grit_400: f64,
        grit_800: f64,
        grit_1800: f64,
    },
    Sealed {
        base: f64,
    },
    Epoxy {
        single: f64,
        metallic: f64,
        quartz: f64,
        flake: f64,
    },
    Other {
        price: f64,
    },
    RangeOnly,
}

/// Compile all fetched rows, stripping a leading `category` header.
pub fn compile(rows: &[Row]) -> Compiled {
    let (body, offset) = PRICING.strip_header(rows);

    let mut compiled = Compiled::default();
    for (i, row) in body.iter().enumerate() {
        // 1-based row number in the sheet as the editor sees it
        let row_number = offset + i + 1;
        compile_row(&mut compiled, row, row_number);
    }

    debug!(
        rows = body.len(),
        polished = compiled.pricing.polished_concrete.len(),
        sealed = compiled.pricing.sealed_concrete.len(),
        epoxy = compiled.pricing.epoxy.len(),
        rejected = compiled.rejected_rows.len(),
        "compiled pricing sheet"
    );

    compiled
}

fn compile_row(compiled: &mut Compiled, row: &Row, row_number: usize) {
    let (Some(raw_category), Some(tier)) = (col::CATEGORY.text_in(row), col::TIER.text_in(row))
    else {
        debug!(row = row_number, "skipping row without category or tier");
        return;
    };

    let category = norm_category(raw_category);

    let parsed = read_range(row).and_then(|range| Ok((range, read_prices(&category, row)?)));
    let (range, prices) = match parsed {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(row = row_number, %category, tier, error = %e, "rejecting pricing row");
            compiled.rejected_rows.push(RowIssue {
                sheet: PRICING.name.to_string(),
                row: row_number,
                reason: e.to_string(),
            });
            return;
        }
    };

    compiled.ranges.record(category.as_key(), tier, range);

    let tier_key = tier.to_string();
    let pricing = &mut compiled.pricing;
    match prices {
        TierPrices::Polished {
            grit_200,
            grit_400,
            grit_800,
            grit_1800,
        } => {
            pricing.polished_concrete.insert(
                tier_key,
                PolishedTier {
                    range,
                    grit_200,
                    grit_400,
                    grit_800,
                    grit_1800,
                },
            );
        }
        TierPrices::Sealed { base } => {
            pricing
                .sealed_concrete
                .insert(tier_key, SealedTier { range, base });
        }
        TierPrices::Epoxy {
            single,
            metallic,
            quartz,
            flake,
        } => {
            pricing.epoxy.insert(
                tier_key,
                EpoxyTier {
                    range,
                    single,
                    metallic,
                    quartz,
                    flake,
                },
            );
        }
        TierPrices::Other { price } => {
            let key = norm_service(col::SERVICE.text_in(row).unwrap_or_default());
            match OtherService::from_key(&key) {
                Some(service) => {
                    pricing.other.service_mut(service).insert(tier_key, price);
                }
                None => debug!(row = row_number, service = %key, "skipping unknown other service"),
            }
        }
        TierPrices::RangeOnly => {}
    }
}

fn read_range(row: &Row) -> Result<PriceRange> {
    Ok(PriceRange {
        min: col::MIN.number_in(row)?,
        max: col::MAX.number_in(row)?,
    })
}

/// Read only the columns the category uses, so stray text in another
/// category's columns does not reject the row.
fn read_prices(category: &Category, row: &Row) -> Result<TierPrices> {
    Ok(match category {
        Category::PolishedConcrete => TierPrices::Polished {
            grit_200: col::GRIT_200.number_in(row)?,
            grit_400: col::GRIT_400.number_in(row)?,
            grit_800: col::GRIT_800.number_in(row)?,
            grit_1800: col::GRIT_1800.number_in(row)?,
        },
        Category::SealedConcrete => TierPrices::Sealed {
            base: col::BASE.number_in(row)?,
        },
        Category::Epoxy => TierPrices::Epoxy {
            single: col::SINGLE.number_in(row)?,
            metallic: col::METALLIC.number_in(row)?,
            quartz: col::QUARTZ.number_in(row)?,
            flake: col::FLAKE.number_in(row)?,
        },
        Category::Other => TierPrices::Other {
            price: col::GRIT_200.number_in(row)?,
        },
        Category::Literal(_) => TierPrices::RangeOnly,
    })
}
