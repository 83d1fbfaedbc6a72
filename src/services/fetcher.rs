//! CSV sheet fetching
//!
//! Pulls published sheets over HTTP and splits them into rows of trimmed
//! cells. The split is deliberately naive: no quoting, so a comma inside a
//! cell shifts the rest of that row.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::types::{FloorcalcError, Result, Row};

/// Per-request timeout in seconds.
///
/// reqwest sets no timeout of its own. This one is an added bound: a hung
/// sheet host holds up a refresh, and every caller waiting on it, for at
/// most this long. Override with `FLOORCALC_REQUEST_TIMEOUT_SECS`.
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Anything that can hand back the raw text of a sheet by URL
#[async_trait]
pub trait CsvSource: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String>;
}

/// Fetches sheets with reqwest
pub struct HttpCsvSource {
    client: reqwest::Client,
}

impl HttpCsvSource {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("floorcalc/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl CsvSource for HttpCsvSource {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FloorcalcError::Fetch {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}

/// Split sheet text into rows.
///
/// Lines break on LF or CRLF, cells on every comma, each cell is trimmed.
/// Rows whose cells are all blank are dropped.
pub fn parse_rows(text: &str) -> Vec<Row> {
    text.lines()
        .map(|line| line.split(',').map(|cell| cell.trim().to_string()).collect::<Row>())
        .filter(|row| row.iter().any(|cell| !cell.is_empty()))
        .collect()
}

/// Fetch a sheet and split it into rows
pub async fn fetch_csv(source: &dyn CsvSource, url: &str) -> Result<Vec<Row>> {
    let text = source.fetch_text(url).await?;
    let rows = parse_rows(&text);
    debug!(url, bytes = text.len(), rows = rows.len(), "fetched sheet");
    Ok(rows)
}
