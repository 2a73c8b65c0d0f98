//! HAL link pagination
//!
//! Extracts the next page from the `_links.next` relation of a response
//! body:
//!
//! ```json
//! { "_links": { "next": { "href": "https://api.example.com/people?page=2" } } }
//! ```

use super::types::{NextPage, PaginationState};
use serde_json::Value;

/// Paginator for `_links.next` continuations
#[derive(Debug, Clone)]
pub struct HalPaginator {
    /// Query parameter carrying the page number
    pub page_param: String,
}

impl Default for HalPaginator {
    fn default() -> Self {
        Self {
            page_param: "page".to_string(),
        }
    }
}

impl HalPaginator {
    /// Create a paginator reading the default `page` parameter
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a paginator reading a custom page parameter
    pub fn with_page_param(page_param: impl Into<String>) -> Self {
        Self {
            page_param: page_param.into(),
        }
    }

    /// True when `_links.next` is present and truthy
    pub fn has_more(&self, body: &Value) -> bool {
        body.get("_links")
            .and_then(|links| links.get("next"))
            .is_some_and(is_truthy)
    }

    /// The literal next href, if it is a non-empty string
    pub fn next_url(&self, body: &Value) -> Option<String> {
        body.get("_links")?
            .get("next")?
            .get("href")?
            .as_str()
            .filter(|href| !href.is_empty())
            .map(str::to_string)
    }

    /// Advisory number of the page after the one `next` points at
    ///
    /// Reads the `page` parameter of the next href (1 when absent or not a
    /// number) and adds one. `None` when there is no next page.
    pub fn next_page_number(&self, body: &Value) -> Option<u32> {
        if !self.has_more(body) {
            return None;
        }

        let current = self
            .next_url(body)
            .and_then(|href| query_param(&href, &self.page_param))
            .and_then(|page| page.parse::<u32>().ok())
            .unwrap_or(1);

        Some(current.saturating_add(1))
    }

    /// Process a fetched page and decide how to continue
    pub fn process_response(
        &self,
        body: &Value,
        records_count: usize,
        state: &mut PaginationState,
    ) -> NextPage {
        state.record_page(records_count);

        match self.next_url(body) {
            Some(url) => NextPage::Continue {
                url,
                page: self.next_page_number(body),
            },
            None => NextPage::Done,
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Read a query parameter from an absolute or relative href
fn query_param(href: &str, name: &str) -> Option<String> {
    let (_, query) = href.split_once('?')?;
    let query = query.split('#').next().unwrap_or_default();

    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}
