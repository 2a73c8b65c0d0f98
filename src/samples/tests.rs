//! Tests for the sample file fallback

use super::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::fs;
use tempfile::TempDir;

fn write_page(dir: &TempDir, file: &str, collection: &str, records: serde_json::Value) {
    let page = json!({
        "_links": {"self": {"href": "https://api.example.com"}},
        "_embedded": { collection: records }
    });
    fs::write(dir.path().join(file), page.to_string()).unwrap();
}

#[test]
fn test_exact_file_used() {
    let dir = TempDir::new().unwrap();
    write_page(&dir, "forms.json", "osdi:forms", json!([{"title": "A"}]));
    write_page(&dir, "forms_extra.json", "osdi:forms", json!([{"title": "B"}]));

    let outcome = SampleFileFallback::new(dir.path()).load("forms");

    assert_eq!(outcome.records, vec![json!({"title": "A"})]);
    assert_eq!(
        outcome.source,
        SampleSource::Exact(dir.path().join("forms.json"))
    );
    assert!(outcome.issues.is_empty());
}

#[test]
fn test_exact_file_malformed_does_not_scan() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("forms.json"), "{ broken").unwrap();
    write_page(&dir, "forms_extra.json", "osdi:forms", json!([{"title": "B"}]));

    let outcome = SampleFileFallback::new(dir.path()).load("forms");

    assert!(outcome.records.is_empty());
    assert_eq!(outcome.source, SampleSource::None);
    assert!(matches!(
        outcome.issues[0],
        FallbackIssue::Malformed { ref path, .. } if path.ends_with("forms.json")
    ));
    assert_eq!(
        outcome.issues[1],
        FallbackIssue::NoSampleData {
            stream: "forms".to_string()
        }
    );
}

#[test]
fn test_substring_scan_unions_matches() {
    let dir = TempDir::new().unwrap();
    write_page(&dir, "b_tags_page2.json", "osdi:tags", json!([{"name": "two"}]));
    write_page(&dir, "a_tags_page1.json", "osdi:tags", json!([{"name": "one"}]));
    write_page(&dir, "people.json", "osdi:people", json!([{"given_name": "Ada"}]));
    fs::write(dir.path().join("tags_notes.txt"), "not json").unwrap();

    let outcome = SampleFileFallback::new(dir.path()).load("tags");

    assert_eq!(
        outcome.records,
        vec![json!({"name": "one"}), json!({"name": "two"})]
    );
    assert_eq!(
        outcome.source,
        SampleSource::Matched(vec![
            dir.path().join("a_tags_page1.json"),
            dir.path().join("b_tags_page2.json"),
        ])
    );
    assert_eq!(
        outcome.issues,
        vec![FallbackIssue::ExactFileMissing {
            path: dir.path().join("tags.json")
        }]
    );
}

#[test]
fn test_substring_scan_skips_malformed() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("events_bad.json"), "[1, 2").unwrap();
    write_page(&dir, "events_good.json", "osdi:events", json!([{"title": "Rally"}]));

    let outcome = SampleFileFallback::new(dir.path()).load("events");

    assert_eq!(outcome.records, vec![json!({"title": "Rally"})]);
    assert!(outcome
        .issues
        .iter()
        .any(|issue| matches!(issue, FallbackIssue::Malformed { .. })));
    assert!(!outcome
        .issues
        .iter()
        .any(|issue| matches!(issue, FallbackIssue::NoSampleData { .. })));
}

#[test]
fn test_no_sample_data() {
    let dir = TempDir::new().unwrap();
    write_page(&dir, "people.json", "osdi:people", json!([{"given_name": "Ada"}]));

    let outcome = SampleFileFallback::new(dir.path()).load("donations");

    assert!(outcome.records.is_empty());
    assert_eq!(outcome.source, SampleSource::None);
    let last = outcome.issues.last().unwrap();
    assert_eq!(
        last,
        &FallbackIssue::NoSampleData {
            stream: "donations".to_string()
        }
    );
    assert!(last.is_error());
}

#[test]
fn test_missing_directory() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope");

    let outcome = SampleFileFallback::new(&missing).load("people");

    assert!(outcome.records.is_empty());
    assert!(outcome
        .issues
        .iter()
        .any(|issue| matches!(issue, FallbackIssue::Unreadable { .. })));
}

#[test]
fn test_collection_key_must_match_stream() {
    let dir = TempDir::new().unwrap();
    write_page(&dir, "lists.json", "osdi:other", json!([{"id": 1}]));

    let outcome = SampleFileFallback::new(dir.path()).load("lists");

    assert!(outcome.records.is_empty());
    assert_eq!(
        outcome.source,
        SampleSource::Exact(dir.path().join("lists.json"))
    );
}

#[test]
fn test_issue_display() {
    let issue = FallbackIssue::NoSampleData {
        stream: "tags".to_string(),
    };
    assert_eq!(issue.to_string(), "No sample data found for stream 'tags'");
    assert!(!FallbackIssue::ExactFileMissing {
        path: "tags.json".into()
    }
    .is_error());
}
