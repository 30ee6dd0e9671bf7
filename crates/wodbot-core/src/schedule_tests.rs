use super::*;
use crate::testing::FakePage;

fn raw(
    time: Option<&str>,
    name: Option<&str>,
    coach: Option<&str>,
    id: Option<&str>,
    label: Option<&str>,
) -> RawClassRow {
    RawClassRow {
        time_text: time.map(str::to_string),
        class_name: name.map(str::to_string),
        coach: coach.map(str::to_string),
        action_id: id.map(str::to_string),
        action_label: label.map(str::to_string),
    }
}

#[test]
fn zero_rows_is_an_extraction_error() {
    let err = normalize_rows(Vec::new()).unwrap_err();
    assert!(matches!(err, RunError::Extraction(_)));
    assert!(err.to_string().contains("no classes found"));
}

#[test]
fn partial_rows_keep_their_place() {
    let records = normalize_rows(vec![
        raw(Some("6:00 AM - 7:00 AM"), Some("CrossFit"), Some("Alex"), Some("b1"), Some("BOOK")),
        raw(None, None, None, None, None),
        raw(Some("5:00 PM - 6:00 PM"), Some("CrossFit"), None, Some("b3"), Some("MANAGE")),
    ])
    .unwrap();

    assert_eq!(records.len(), 3);
    assert_eq!(
        records.iter().map(|r| r.index).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );

    // Absent sub-lookups normalize to typed defaults, never to a failure.
    assert_eq!(records[1].time_range, "");
    assert_eq!(records[1].class_name, "");
    assert_eq!(records[1].coach, "");
    assert_eq!(records[1].action_id, None);
    assert_eq!(records[1].action_label, "");
}

#[test]
fn time_takes_only_the_first_line() {
    let records = normalize_rows(vec![raw(
        Some("5:00 PM - 6:00 PM\n12 spots left\nReserved"),
        Some("CrossFit"),
        None,
        None,
        None,
    )])
    .unwrap();
    assert_eq!(records[0].time_range, "5:00 PM - 6:00 PM");
}

#[test]
fn empty_action_id_normalizes_to_absent() {
    let records =
        normalize_rows(vec![raw(Some("6:00 AM"), None, None, Some(""), Some("BOOK"))]).unwrap();
    assert_eq!(records[0].action_id, None);
    assert!(!records[0].is_bookable());
}

#[test]
fn display_order_is_preserved() {
    // Rows arrive in whatever order the site rendered them; no re-sorting.
    let records = normalize_rows(vec![
        raw(Some("5:00 PM - 6:00 PM"), Some("Evening"), None, None, None),
        raw(Some("6:00 AM - 7:00 AM"), Some("Morning"), None, None, None),
    ])
    .unwrap();
    assert_eq!(records[0].class_name, "Evening");
    assert_eq!(records[1].class_name, "Morning");
}

#[tokio::test]
async fn extractor_reads_rows_from_the_page() {
    let page = FakePage::happy(vec![
        raw(Some("6:00 AM - 7:00 AM"), Some("CrossFit"), Some("Alex"), Some("b1"), Some("BOOK")),
        raw(Some("7:15 AM - 8:15 AM"), Some("Open Gym"), None, None, None),
    ]);

    let records = ScheduleExtractor::extract(&page).await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].class_name, "CrossFit");
    assert!(records[0].is_bookable());
    assert!(!records[1].is_bookable());
}

#[tokio::test]
async fn page_failure_classifies_as_extraction() {
    let page = FakePage::new();
    *page.rows_fail.lock().unwrap() = true;

    let err = ScheduleExtractor::extract(&page).await.unwrap_err();
    assert!(matches!(err, RunError::Extraction(_)));
}
