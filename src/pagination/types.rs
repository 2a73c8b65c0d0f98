//! Continuation, loop progress and the page budget

use crate::error::{Error, Result};
use std::time::{Duration, Instant};

/// What follows the page just processed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextPage {
    /// Fetch `url` next
    Continue {
        /// Literal address of the next page
        url: String,
        /// Advisory page number derived from the link
        page: Option<u32>,
    },
    /// The chain ended
    Done,
}

/// Progress of one pagination loop
#[derive(Debug, Clone)]
pub struct PaginationState {
    /// Pages fetched so far
    pub pages: u32,
    /// Records seen across those pages
    pub records: u64,
    started: Instant,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self::new()
    }
}

impl PaginationState {
    /// Fresh state; the elapsed clock starts now
    pub fn new() -> Self {
        Self {
            pages: 0,
            records: 0,
            started: Instant::now(),
        }
    }

    /// Count a fetched page and its records
    pub fn record_page(&mut self, records: usize) {
        self.pages += 1;
        self.records += records as u64;
    }

    /// Time since the loop started
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Upper bounds for one pagination loop
///
/// A misbehaving server can hand out `next` links forever; the budget turns
/// that into [`Error::PaginationBudgetExceeded`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageBudget {
    /// Maximum pages to follow (`None` = unbounded)
    pub max_pages: Option<u32>,
    /// Maximum wall-clock time for the loop (`None` = unbounded)
    pub max_elapsed: Option<Duration>,
}

impl Default for PageBudget {
    fn default() -> Self {
        Self {
            max_pages: Some(1000),
            max_elapsed: None,
        }
    }
}

impl PageBudget {
    /// No limits at all
    pub fn unbounded() -> Self {
        Self {
            max_pages: None,
            max_elapsed: None,
        }
    }

    /// Set the page limit
    #[must_use]
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    /// Set the elapsed-time limit
    #[must_use]
    pub fn with_max_elapsed(mut self, max_elapsed: Duration) -> Self {
        self.max_elapsed = Some(max_elapsed);
        self
    }

    /// Check whether another page may be fetched from `url`
    pub fn check(&self, state: &PaginationState, url: &str) -> Result<()> {
        if let Some(max) = self.max_pages {
            if state.pages >= max {
                return Err(Error::budget_exceeded(url, state.pages));
            }
        }
        if let Some(max) = self.max_elapsed {
            if state.elapsed() > max {
                return Err(Error::budget_exceeded(url, state.pages));
            }
        }
        Ok(())
    }
}
