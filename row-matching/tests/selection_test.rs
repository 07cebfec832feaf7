//! Integration tests for the selection state machine.

mod common;

use common::order;
use row_matching::models::OrderStatus;
use row_matching::services::{PrimaryAction, SelectionEvent, SelectionState, Stage};

#[test]
fn starts_browsing_with_nothing_selected() {
    let state = SelectionState::new();
    assert_eq!(state.stage(), Stage::Browsing);
    assert!(state.selected().is_none());
    assert!(!state.is_submitting());
    assert_eq!(state.primary_action(), None);
}

#[test]
fn reselecting_keeps_exactly_the_latest_candidate() {
    let state = SelectionState::new()
        .apply(SelectionEvent::Select(order("a", Some(OrderStatus::Pending), 100)))
        .apply(SelectionEvent::Select(order("b", Some(OrderStatus::Paid), 200)));

    assert_eq!(state.selected().map(|o| o.id.as_str()), Some("b"));
    assert_eq!(state.stage(), Stage::Browsing);
}

#[test]
fn next_without_selection_is_a_no_op() {
    let state = SelectionState::new();
    assert!(!state.can_advance());

    let after = state.clone().apply(SelectionEvent::Next);
    assert_eq!(after, state);
}

#[test]
fn pending_selection_offers_next_and_reaches_confirming() {
    let state = SelectionState::new()
        .apply(SelectionEvent::Select(order("a", Some(OrderStatus::Pending), 100)));
    assert_eq!(state.primary_action(), Some(PrimaryAction::Next));

    let state = state.apply(SelectionEvent::Next);
    assert!(state.is_confirming());
    assert!(state.selected().is_some());
}

#[test]
fn unset_status_is_treated_as_pending() {
    let state = SelectionState::new()
        .apply(SelectionEvent::Select(order("a", None, 100)))
        .apply(SelectionEvent::Next);
    assert!(state.is_confirming());
}

#[test]
fn settled_selection_offers_save_and_skips_confirming() {
    let state = SelectionState::new()
        .apply(SelectionEvent::Select(order("a", Some(OrderStatus::Paid), 100)));
    assert_eq!(state.primary_action(), Some(PrimaryAction::Save));
    assert!(state.can_save());

    let state = state.apply(SelectionEvent::Next);
    assert_eq!(state.stage(), Stage::Browsing);

    let state = state
        .apply(SelectionEvent::SubmitStarted)
        .apply(SelectionEvent::SubmitSucceeded);
    assert!(state.is_closed());
}

#[test]
fn back_returns_to_browsing_and_keeps_selection() {
    let state = SelectionState::new()
        .apply(SelectionEvent::Select(order("a", Some(OrderStatus::Pending), 100)))
        .apply(SelectionEvent::Next)
        .apply(SelectionEvent::Back);

    assert_eq!(state.stage(), Stage::Browsing);
    assert_eq!(state.selected().map(|o| o.id.as_str()), Some("a"));
}

#[test]
fn submitting_blocks_a_second_submission() {
    let state = SelectionState::new()
        .apply(SelectionEvent::Select(order("a", Some(OrderStatus::Pending), 100)))
        .apply(SelectionEvent::Next)
        .apply(SelectionEvent::SubmitStarted);
    assert!(state.is_submitting());

    let again = state.clone().apply(SelectionEvent::SubmitStarted);
    assert_eq!(again, state);
}

#[test]
fn failed_submit_resets_the_flag_and_stays_confirming() {
    let state = SelectionState::new()
        .apply(SelectionEvent::Select(order("a", Some(OrderStatus::Pending), 100)))
        .apply(SelectionEvent::Next)
        .apply(SelectionEvent::SubmitStarted)
        .apply(SelectionEvent::SubmitFailed);

    assert!(state.is_confirming());
    assert!(!state.is_submitting());
}

#[test]
fn cancel_closes_from_any_stage() {
    let browsing = SelectionState::new().apply(SelectionEvent::Cancel);
    assert!(browsing.is_closed());

    let confirming = SelectionState::new()
        .apply(SelectionEvent::Select(order("a", Some(OrderStatus::Pending), 100)))
        .apply(SelectionEvent::Next)
        .apply(SelectionEvent::Cancel);
    assert!(confirming.is_closed());
}
