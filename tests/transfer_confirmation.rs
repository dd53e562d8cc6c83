use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tokio::time::sleep;

use finvo::transfer::{
    CancelOutcome, CancellationError, ConfirmationState, ControllerConfig, MockTransferService,
    Phase, SubmissionError, TransferConfirmation, TransferRequest,
};

fn request() -> TransferRequest {
    TransferRequest::new(1, "FR00000002", Decimal::from(100), Some("loyer".to_string())).unwrap()
}

fn setup() -> (Arc<MockTransferService>, TransferConfirmation) {
    let mock = Arc::new(MockTransferService::new("mock"));
    let confirmation = TransferConfirmation::new(mock.clone(), ControllerConfig::default());
    (mock, confirmation)
}

#[tokio::test(start_paused = true)]
async fn test_submit_opens_window() {
    let (mock, confirmation) = setup();
    mock.set_next_transaction_id(42);

    let state = confirmation.start(request()).await;

    assert_eq!(state.phase(), Phase::Completed);
    assert_eq!(state.transaction_id().unwrap().as_u64(), 42);
    assert_eq!(state.remaining(), Some(5));
    assert!(state.can_cancel());
    assert!(confirmation.is_ticking());
    assert_eq!(mock.submit_calls(), 1);
    assert_eq!(mock.last_request().unwrap().description(), Some("loyer"));
}

#[tokio::test(start_paused = true)]
async fn test_start_submits_once() {
    let (mock, confirmation) = setup();

    let first = confirmation.start(request()).await;
    let second = confirmation.start(request()).await;

    assert_eq!(mock.submit_calls(), 1);
    assert_eq!(first.transaction_id(), second.transaction_id());
}

#[tokio::test(start_paused = true)]
async fn test_countdown_reaches_expiry() {
    let (_mock, confirmation) = setup();
    confirmation.start(request()).await;

    // Check between ticks
    sleep(Duration::from_millis(1500)).await;
    assert_eq!(confirmation.state().remaining(), Some(4));

    for expected in [3, 2, 1] {
        sleep(Duration::from_secs(1)).await;
        assert_eq!(confirmation.state().remaining(), Some(expected));
    }

    sleep(Duration::from_secs(1)).await;
    let state = confirmation.state();
    assert_eq!(state.phase(), Phase::CancelWindowExpired);
    assert!(state.is_settled());
    assert!(!state.can_cancel());
    assert!(!confirmation.is_ticking());
    assert!(confirmation.receipt().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_subscribers_see_every_tick() {
    let (_mock, confirmation) = setup();
    let mut rx = confirmation.subscribe();
    confirmation.start(request()).await;

    let mut seen = Vec::new();
    loop {
        let state = rx.borrow_and_update().clone();
        match state.remaining() {
            Some(remaining) => seen.push(remaining),
            None if state.phase() == Phase::CancelWindowExpired => break,
            None => {}
        }
        rx.changed().await.unwrap();
    }

    assert_eq!(seen, vec![5, 4, 3, 2, 1]);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_inside_window() {
    let (mock, confirmation) = setup();
    let mut rx = confirmation.subscribe();
    confirmation.start(request()).await;

    sleep(Duration::from_millis(2500)).await;
    assert_eq!(confirmation.state().remaining(), Some(3));

    let outcome = confirmation.request_cancel().await;
    assert_eq!(outcome, CancelOutcome::Cancelled);
    assert_eq!(mock.cancel_calls(), 1);
    assert_eq!(confirmation.phase(), Phase::Cancelled);
    assert!(!confirmation.is_ticking());
    assert!(confirmation.receipt().is_none());

    // No tick after the cancellation
    let _ = rx.borrow_and_update();
    sleep(Duration::from_secs(5)).await;
    assert!(!rx.has_changed().unwrap());
    assert_eq!(confirmation.phase(), Phase::Cancelled);
}

#[tokio::test(start_paused = true)]
async fn test_too_late_rejection_is_silent() {
    let (mock, confirmation) = setup();
    mock.set_cancel_result(Err(CancellationError::Expired));
    confirmation.start(request()).await;

    sleep(Duration::from_millis(4500)).await;
    let outcome = confirmation.request_cancel().await;

    assert_eq!(outcome, CancelOutcome::Rejected { reason: None });
    let state = confirmation.state();
    assert_eq!(state.phase(), Phase::CancelRejected);
    assert!(state.is_settled());
    assert!(state.error_message().is_none());
    assert!(confirmation.receipt().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_cancel_at_expiry_instant() {
    let (mock, confirmation) = setup();
    mock.set_cancel_result(Err(CancellationError::Expired));
    confirmation.start(request()).await;

    // The last tick and the click land on the same instant
    sleep(Duration::from_millis(5000)).await;
    let outcome = confirmation.request_cancel().await;
    let state = confirmation.state();

    match outcome {
        CancelOutcome::Ignored => {
            assert_eq!(state.phase(), Phase::CancelWindowExpired);
            assert_eq!(mock.cancel_calls(), 0);
        }
        CancelOutcome::Rejected { reason: None } => {
            assert_eq!(state.phase(), Phase::CancelRejected);
            assert_eq!(mock.cancel_calls(), 1);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
    assert!(state.is_settled());
    assert!(state.error_message().is_none());
    assert!(confirmation.receipt().is_some());

    sleep(Duration::from_secs(2)).await;
    assert_eq!(confirmation.state(), state);
}

#[tokio::test(start_paused = true)]
async fn test_other_rejection_is_shown() {
    let (mock, confirmation) = setup();
    mock.set_cancel_result(Err(CancellationError::Other("Transaction introuvable".to_string())));
    confirmation.start(request()).await;

    let outcome = confirmation.request_cancel().await;

    assert_eq!(
        outcome,
        CancelOutcome::Rejected {
            reason: Some("Transaction introuvable".to_string())
        }
    );
    assert_eq!(confirmation.state().error_message(), Some("Transaction introuvable"));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_after_expiry_is_ignored() {
    let (mock, confirmation) = setup();
    confirmation.start(request()).await;

    sleep(Duration::from_secs(6)).await;
    assert_eq!(confirmation.request_cancel().await, CancelOutcome::Ignored);
    assert_eq!(mock.cancel_calls(), 0);
    assert_eq!(confirmation.phase(), Phase::CancelWindowExpired);
}

#[tokio::test(start_paused = true)]
async fn test_double_click_cancels_once() {
    let (mock, confirmation) = setup();
    mock.set_latency(Duration::from_millis(200));
    confirmation.start(request()).await;

    let (a, b) = tokio::join!(confirmation.request_cancel(), confirmation.request_cancel());

    assert_eq!(mock.cancel_calls(), 1);
    assert!(
        (a == CancelOutcome::Cancelled && b == CancelOutcome::Ignored)
            || (a == CancelOutcome::Ignored && b == CancelOutcome::Cancelled)
    );
    assert_eq!(confirmation.request_cancel().await, CancelOutcome::Ignored);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_in_flight_blocks_countdown() {
    let (mock, confirmation) = setup();
    mock.set_latency(Duration::from_secs(10));
    confirmation.start(request()).await;

    let confirmation = Arc::new(confirmation);
    let task = {
        let confirmation = Arc::clone(&confirmation);
        tokio::spawn(async move { confirmation.request_cancel().await })
    };

    sleep(Duration::from_millis(100)).await;
    assert_eq!(confirmation.phase(), Phase::Cancelling);
    assert!(!confirmation.is_ticking());

    // The window would have run out meanwhile; the cancel result still wins
    assert_eq!(task.await.unwrap(), CancelOutcome::Cancelled);
    assert_eq!(confirmation.phase(), Phase::Cancelled);
}

#[tokio::test(start_paused = true)]
async fn test_submit_failure() {
    let (mock, confirmation) = setup();
    mock.set_submit_error(SubmissionError::Rejected {
        status: 400,
        message: "Solde insuffisant".to_string(),
    });

    let state = confirmation.start(request()).await;

    assert_eq!(state.phase(), Phase::Failed);
    assert_eq!(state.error_message(), Some("Solde insuffisant"));
    assert!(state.transaction_id().is_none());
    assert!(!confirmation.is_ticking());
    assert_eq!(confirmation.request_cancel().await, CancelOutcome::Ignored);
    assert!(confirmation.receipt().is_none());

    // A failed lifecycle does not resubmit on its own
    confirmation.start(request()).await;
    assert_eq!(mock.submit_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_pending_while_in_flight() {
    let (mock, confirmation) = setup();
    mock.set_latency(Duration::from_secs(1));

    let confirmation = Arc::new(confirmation);
    let task = {
        let confirmation = Arc::clone(&confirmation);
        tokio::spawn(async move { confirmation.start(request()).await })
    };

    sleep(Duration::from_millis(10)).await;
    assert_eq!(confirmation.phase(), Phase::Pending);
    assert_eq!(confirmation.request_cancel().await, CancelOutcome::Ignored);

    let state = task.await.unwrap();
    assert_eq!(state.phase(), Phase::Completed);
    // Window measured from the response, not the click
    assert_eq!(state.remaining(), Some(5));
}

#[tokio::test(start_paused = true)]
async fn test_new_transfer_after_terminal_state() {
    let (mock, confirmation) = setup();
    confirmation.start(request()).await;
    sleep(Duration::from_secs(6)).await;
    assert_eq!(confirmation.phase(), Phase::CancelWindowExpired);

    confirmation.new_transfer();
    let state = confirmation.state();
    assert_eq!(state, ConfirmationState::Idle);
    assert!(state.transaction_id().is_none());
    assert!(!confirmation.is_ticking());

    let state = confirmation.start(request()).await;
    assert_eq!(mock.submit_calls(), 2);
    assert_eq!(state.transaction_id().unwrap().as_u64(), 2);
    assert_eq!(state.remaining(), Some(5));
}

#[tokio::test(start_paused = true)]
async fn test_new_transfer_during_countdown() {
    let (_mock, confirmation) = setup();
    confirmation.start(request()).await;
    sleep(Duration::from_millis(1500)).await;

    confirmation.new_transfer();
    assert_eq!(confirmation.phase(), Phase::Idle);
    assert!(!confirmation.is_ticking());

    sleep(Duration::from_secs(6)).await;
    assert_eq!(confirmation.phase(), Phase::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_late_response_after_reset_is_dropped() {
    let (mock, confirmation) = setup();
    mock.set_latency(Duration::from_secs(1));

    let confirmation = Arc::new(confirmation);
    let task = {
        let confirmation = Arc::clone(&confirmation);
        tokio::spawn(async move { confirmation.start(request()).await })
    };

    sleep(Duration::from_millis(100)).await;
    confirmation.new_transfer();

    let state = task.await.unwrap();
    assert_eq!(state, ConfirmationState::Idle);
    assert_eq!(mock.submit_calls(), 1);

    sleep(Duration::from_secs(10)).await;
    assert_eq!(confirmation.phase(), Phase::Idle);
    assert!(!confirmation.is_ticking());
}

#[tokio::test(start_paused = true)]
async fn test_custom_window_length() {
    let mock = Arc::new(MockTransferService::new("mock"));
    let config = ControllerConfig {
        window_secs: 3,
        ..ControllerConfig::default()
    };
    let confirmation = TransferConfirmation::new(mock, config);

    let state = confirmation.start(request()).await;
    assert_eq!(state.remaining(), Some(3));
    assert_eq!(confirmation.window_secs(), 3);

    sleep(Duration::from_millis(3500)).await;
    assert_eq!(confirmation.phase(), Phase::CancelWindowExpired);
}

#[tokio::test(start_paused = true)]
async fn test_receipt_from_completed_transfer() {
    let (mock, confirmation) = setup();
    mock.set_next_transaction_id(77);
    confirmation.start(request()).await;

    let receipt = confirmation.receipt().unwrap();
    assert_eq!(receipt.transaction_id.as_u64(), 77);
    assert_eq!(receipt.source_account_number, "FR00000001");
    assert_eq!(receipt.destination_account_number, "FR00000002");
    assert!(receipt.file_name().starts_with("recu-virement-77-"));
    assert!(receipt.render_text().contains("100.00 €"));
}
