//! Pagination module
//!
//! Follows HAL-style `_links.next` relations page by page.
//!
//! # Overview
//!
//! OSDI responses advertise their continuation as a hypermedia link. The
//! [`HalPaginator`] reads that link, derives the advisory page number from
//! its `page` query parameter, and reports when the chain ends. Every loop
//! driven by it is bounded by a [`PageBudget`].

mod hal;
mod types;

pub use hal::HalPaginator;
pub use types::{NextPage, PageBudget, PaginationState};

#[cfg(test)]
mod tests;
