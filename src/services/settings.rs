//! Surcharge settings overlay
//!
//! Optional second sheet of `key,value` rows layered over the built-in
//! defaults. Best effort: a failed fetch never fails the pricing request,
//! it only shows up in diagnostics and the log.

use tracing::{debug, warn};

use super::fetcher::{fetch_csv, CsvSource};
use super::schema::{settings as col, SETTINGS};
use crate::types::{Diagnostics, Result, Row, RowIssue, Settings};

/// Load settings from `url` over the defaults.
///
/// With no URL the defaults come back untouched. Any fetch or shape error
/// also yields the untouched defaults, with the error captured in
/// `Diagnostics::settings_error`.
pub async fn load_settings(source: &dyn CsvSource, url: Option<&str>) -> (Settings, Diagnostics) {
    let mut diagnostics = Diagnostics::default();

    let Some(url) = url else {
        return (Settings::default(), diagnostics);
    };

    match fetch_settings(source, url).await {
        Ok((settings, rejected_rows)) => {
            diagnostics.rejected_rows = rejected_rows;
            (settings, diagnostics)
        }
        Err(e) => {
            warn!(url, error = %e, "settings sheet unavailable, keeping defaults");
            diagnostics.settings_error = Some(e.to_string());
            (Settings::default(), diagnostics)
        }
    }
}

async fn fetch_settings(source: &dyn CsvSource, url: &str) -> Result<(Settings, Vec<RowIssue>)> {
    let rows = fetch_csv(source, url).await?;
    Ok(apply_rows(Settings::default(), &rows))
}

/// Overlay sheet rows onto `settings`, returning rows whose value was unusable
pub fn apply_rows(mut settings: Settings, rows: &[Row]) -> (Settings, Vec<RowIssue>) {
    let (body, offset) = SETTINGS.strip_header(rows);

    let mut rejected = Vec::new();
    for (i, row) in body.iter().enumerate() {
        let row_number = offset + i + 1;

        let Some(key) = col::KEY.text_in(row) else {
            continue;
        };

        match col::VALUE.number_in(row) {
            Ok(value) => {
                debug!(key, value, "settings override");
                settings.set(key, value);
            }
            Err(e) => {
                warn!(row = row_number, key, error = %e, "ignoring settings row");
                rejected.push(RowIssue {
                    sheet: SETTINGS.name.to_string(),
                    row: row_number,
                    reason: e.to_string(),
                });
            }
        }
    }

    (settings, rejected)
}
