use wodbot_llm::SelectionDecision;

use super::*;

fn records() -> Vec<ClassRecord> {
    vec![
        ClassRecord {
            index: 0,
            time_range: "6:00 AM - 7:00 AM".to_string(),
            class_name: "CrossFit".to_string(),
            coach: "Alex".to_string(),
            action_id: Some("b1".to_string()),
            action_label: "BOOK".to_string(),
        },
        ClassRecord {
            index: 1,
            time_range: "7:15 AM - 8:15 AM".to_string(),
            class_name: "Open Gym".to_string(),
            coach: String::new(),
            action_id: None,
            action_label: String::new(),
        },
        ClassRecord {
            index: 2,
            time_range: "5:00 PM - 6:00 PM".to_string(),
            class_name: "CrossFit".to_string(),
            coach: "Sam".to_string(),
            action_id: Some("b3".to_string()),
            action_label: "MANAGE".to_string(),
        },
    ]
}

fn decision(index: i64) -> SelectionDecision {
    SelectionDecision {
        selected_index: index,
        reasoning: "scripted".to_string(),
        notify_user: false,
    }
}

#[test]
fn empty_roster_is_rejected() {
    let err = validate(decision(0), &[]).unwrap_err();
    assert!(matches!(err, RunError::Selection(_)));
}

#[test]
fn negative_index_is_rejected_not_clamped() {
    let err = validate(decision(-1), &records()).unwrap_err();
    assert!(matches!(err, RunError::Selection(_)));
    assert!(err.to_string().contains("-1"));
}

#[test]
fn index_equal_to_len_is_rejected() {
    let err = validate(decision(3), &records()).unwrap_err();
    assert!(matches!(err, RunError::Selection(_)));
}

#[test]
fn error_message_names_the_offending_index() {
    let err = validate(decision(5), &records()).unwrap_err();
    assert!(err.to_string().contains("5"));
    assert!(err.to_string().contains("0-2"));
}

#[test]
fn every_in_range_index_returns_the_exact_record() {
    let records = records();
    for i in 0..records.len() {
        let selection = validate(decision(i as i64), &records).unwrap();
        assert_eq!(selection.record, records[i]);
    }
}

#[test]
fn valid_reference_to_an_unbookable_record_passes() {
    // Bookability is the booking executor's concern, not the validator's.
    let selection = validate(decision(1), &records()).unwrap();
    assert!(!selection.record.is_bookable());
    assert_eq!(selection.record.index, 1);
}

#[test]
fn reasoning_and_notify_flag_pass_through() {
    let selection = validate(
        SelectionDecision {
            selected_index: 2,
            reasoning: "evening class; mornings full".to_string(),
            notify_user: true,
        },
        &records(),
    )
    .unwrap();
    assert_eq!(selection.reasoning, "evening class; mornings full");
    assert!(selection.notify_user);
}
