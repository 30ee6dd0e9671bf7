use chrono::NaiveDate;

use super::*;
use crate::testing::{FakePage, Script};

fn target(month: u32, day: u32) -> TargetDate {
    TargetDate::from_date(NaiveDate::from_ymd_opt(2026, month, day).unwrap())
}

fn record(action_id: Option<&str>, action_label: &str) -> ClassRecord {
    ClassRecord {
        index: 0,
        time_range: "6:00 AM - 7:00 AM".to_string(),
        class_name: "CrossFit".to_string(),
        coach: "Alex".to_string(),
        action_id: action_id.map(str::to_string),
        action_label: action_label.to_string(),
    }
}

#[tokio::test]
async fn select_date_clicks_the_matching_cell() {
    let mut page = FakePage::new();
    page.date_cell = Script::always(true);

    BookingExecutor::select_date(&page, &target(11, 14)).await.unwrap();

    assert_eq!(page.date_clicks.lock().unwrap().as_slice(), [(11, 14)]);
}

#[tokio::test]
async fn missing_cell_is_a_navigation_error_naming_the_label() {
    let page = FakePage::new();

    let err = BookingExecutor::select_date(&page, &target(11, 14))
        .await
        .unwrap_err();

    assert!(matches!(err, RunError::Navigation(_)));
    assert!(err.to_string().contains("11/14"));
}

#[tokio::test]
async fn book_requires_an_action_id() {
    let page = FakePage::new();

    let err = BookingExecutor::book(&page, &record(None, "BOOK"))
        .await
        .unwrap_err();

    assert!(matches!(err, RunError::Booking(_)));
    assert!(err.to_string().contains("no action id"));
    assert!(page.action_clicks.lock().unwrap().is_empty());
}

#[tokio::test]
async fn book_clicks_the_action_then_confirms() {
    let page = FakePage::new();

    BookingExecutor::book(&page, &record(Some("b1"), "BOOK"))
        .await
        .unwrap();

    assert_eq!(
        page.action_clicks.lock().unwrap().as_slice(),
        ["b1".to_string()]
    );
    assert_eq!(page.confirm_attempts.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_confirm_is_terminal_without_retry() {
    let mut page = FakePage::new();
    page.confirm_ok = Script::always(false);

    let err = BookingExecutor::book(&page, &record(Some("b1"), "BOOK"))
        .await
        .unwrap_err();

    assert!(matches!(err, RunError::Booking(_)));
    assert!(err.to_string().contains("verify manually"));
    // The click already went out; nothing is attempted a second time.
    assert_eq!(page.action_clicks.lock().unwrap().len(), 1);
    assert_eq!(page.confirm_attempts.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_action_click_never_reaches_confirm() {
    let mut page = FakePage::new();
    page.action_ok = Script::always(false);

    let err = BookingExecutor::book(&page, &record(Some("b1"), "BOOK"))
        .await
        .unwrap_err();

    assert!(matches!(err, RunError::Booking(_)));
    assert_eq!(page.confirm_attempts.load(std::sync::atomic::Ordering::SeqCst), 0);
}
