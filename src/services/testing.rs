//! In-memory CSV source for unit tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::fetcher::CsvSource;
use crate::types::{FloorcalcError, Result};

#[derive(Clone)]
enum Reply {
    Sheet(String),
    Status(u16),
}

/// Serves canned sheets by URL and counts fetches
pub struct FakeSource {
    replies: Mutex<HashMap<String, Reply>>,
    fetches: AtomicUsize,
    delay: Option<Duration>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(HashMap::new()),
            fetches: AtomicUsize::new(0),
            delay: None,
        }
    }

    pub fn with_sheet(self, url: &str, text: &str) -> Self {
        self.set_sheet(url, text);
        self
    }

    pub fn with_status(self, url: &str, status: u16) -> Self {
        self.replies
            .lock()
            .unwrap()
            .insert(url.to_string(), Reply::Status(status));
        self
    }

    /// Sleep before answering, to hold requests in flight
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_sheet(&self, url: &str, text: &str) {
        self.replies
            .lock()
            .unwrap()
            .insert(url.to_string(), Reply::Sheet(text.to_string()));
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CsvSource for FakeSource {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let reply = self.replies.lock().unwrap().get(url).cloned();
        match reply {
            Some(Reply::Sheet(text)) => Ok(text),
            Some(Reply::Status(status)) => Err(FloorcalcError::Fetch {
                url: url.to_string(),
                status,
            }),
            None => Err(FloorcalcError::Fetch {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}
