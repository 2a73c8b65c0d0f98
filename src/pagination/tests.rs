use super::*;
use serde_json::{json, Value};
use std::time::Duration;
use test_case::test_case;

fn page_with_next(href: &str) -> Value {
    json!({
        "_links": {
            "self": {"href": "https://api.example.com/people"},
            "next": {"href": href}
        },
        "_embedded": {"osdi:people": [{"id": 1}]}
    })
}

#[test]
fn test_pagination_state_counts_pages_and_records() {
    let mut state = PaginationState::new();
    assert_eq!((state.pages, state.records), (0, 0));

    state.record_page(25);
    state.record_page(0);
    assert_eq!((state.pages, state.records), (2, 25));
}

// ============================================================================
// HalPaginator Tests
// ============================================================================

#[test_case(json!({"_links": {"next": {"href": "u"}}}), true ; "next object")]
#[test_case(json!({"_links": {"next": "u"}}), true ; "next string")]
#[test_case(json!({"_links": {"next": null}}), false ; "next null")]
#[test_case(json!({"_links": {"next": false}}), false ; "next false")]
#[test_case(json!({"_links": {"next": {}}}), false ; "next empty object")]
#[test_case(json!({"_links": {"self": {"href": "u"}}}), false ; "no next")]
#[test_case(json!({}), false ; "no links")]
fn test_has_more(body: Value, expected: bool) {
    assert_eq!(HalPaginator::new().has_more(&body), expected);
}

#[test]
fn test_next_url_literal_href() {
    let paginator = HalPaginator::new();
    let body = page_with_next("https://api.example.com/people?page=3&per_page=25");
    assert_eq!(
        paginator.next_url(&body),
        Some("https://api.example.com/people?page=3&per_page=25".to_string())
    );
}

#[test]
fn test_next_url_empty_href_is_terminal() {
    let paginator = HalPaginator::new();
    assert!(paginator.next_url(&page_with_next("")).is_none());
    assert!(paginator
        .next_url(&json!({"_links": {"next": {"title": "no href"}}}))
        .is_none());
}

#[test_case("https://api.example.com/people?page=3", Some(4) ; "absolute url")]
#[test_case("/api/v2/people?per_page=25&page=7", Some(8) ; "relative url")]
#[test_case("https://api.example.com/people", Some(2) ; "missing page defaults to 1")]
#[test_case("https://api.example.com/people?page=abc", Some(2) ; "unparsable page defaults to 1")]
#[test_case("https://api.example.com/people?page=5#frag", Some(6) ; "fragment ignored")]
fn test_next_page_number(href: &str, expected: Option<u32>) {
    let body = page_with_next(href);
    assert_eq!(HalPaginator::new().next_page_number(&body), expected);
}

#[test]
fn test_next_page_number_without_next() {
    let body = json!({"_links": {"self": {"href": "u"}}});
    assert_eq!(HalPaginator::new().next_page_number(&body), None);
}

#[test]
fn test_next_page_number_custom_param() {
    let paginator = HalPaginator::with_page_param("p");
    let body = page_with_next("https://api.example.com/people?p=9&page=1");
    assert_eq!(paginator.next_page_number(&body), Some(10));
}

#[test]
fn test_process_response_continue() {
    let paginator = HalPaginator::new();
    let mut state = PaginationState::new();

    let next = paginator.process_response(
        &page_with_next("https://api.example.com/people?page=2"),
        25,
        &mut state,
    );

    assert_eq!(
        next,
        NextPage::Continue {
            url: "https://api.example.com/people?page=2".to_string(),
            page: Some(3),
        }
    );
    assert_eq!((state.pages, state.records), (1, 25));
}

#[test]
fn test_process_response_stops_without_next() {
    let paginator = HalPaginator::new();
    let mut state = PaginationState::new();

    let body = json!({"_links": {"self": {"href": "u"}}, "_embedded": {}});
    let next = paginator.process_response(&body, 3, &mut state);

    assert_eq!(next, NextPage::Done);
    assert_eq!((state.pages, state.records), (1, 3));
}

// ============================================================================
// PageBudget Tests
// ============================================================================

#[test]
fn test_page_budget_default() {
    let budget = PageBudget::default();
    assert_eq!(budget.max_pages, Some(1000));
    assert!(budget.max_elapsed.is_none());
}

#[test]
fn test_page_budget_allows_first_page() {
    let budget = PageBudget::unbounded().with_max_pages(1);
    assert!(budget.check(&PaginationState::new(), "u").is_ok());
}

#[test]
fn test_page_budget_exceeded_after_max_pages() {
    let budget = PageBudget::unbounded().with_max_pages(2);
    let mut state = PaginationState::new();

    state.record_page(10);
    assert!(budget.check(&state, "u").is_ok());

    state.record_page(10);
    let err = budget.check(&state, "https://api.example.com/people?page=3");
    assert!(matches!(
        err,
        Err(crate::Error::PaginationBudgetExceeded { pages: 2, .. })
    ));
}

#[test]
fn test_page_budget_elapsed() {
    let budget = PageBudget::unbounded().with_max_elapsed(Duration::ZERO);
    let state = PaginationState::new();
    std::thread::sleep(Duration::from_millis(2));
    assert!(budget.check(&state, "u").is_err());
}

#[test]
fn test_page_budget_unbounded() {
    let budget = PageBudget::unbounded();
    let mut state = PaginationState::new();
    for _ in 0..10_000 {
        state.record_page(1);
    }
    assert!(budget.check(&state, "u").is_ok());
}
