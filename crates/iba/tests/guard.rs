//! Async guard behavior.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use iba::{ActionRequest, DenialReason, IntentGuard, IntentStatus, NoDrift};
use iba_testkit::{healthcare_scope, payments_scope, TestFixture, HOUR};

fn fixture() -> TestFixture {
    TestFixture::with_seed("user@example.com", [0x66; 32])
}

/// Intent valid from now for one hour.
fn live_intent(fixture: &TestFixture) -> iba::IntentDeclaration {
    fixture
        .intent("intent-guard", "Schedule a doctor appointment", healthcare_scope())
        .issued_at(iba::core::now_millis())
        .expires_in(HOUR)
        .sign(&fixture.keypair)
        .unwrap()
}

#[tokio::test]
async fn guard_allows_in_scope_action() {
    let fixture = fixture();
    let guard = IntentGuard::new(fixture.engine(live_intent(&fixture), NoDrift));

    let result = guard
        .validate(ActionRequest::new("read", "calendar:today"), Duration::from_secs(5))
        .await;
    assert!(result.allowed, "{}", result.reason);
    assert_eq!(guard.engine().stats().allowed, 1);
}

#[tokio::test]
async fn guard_denies_on_timeout() {
    let fixture = fixture();
    let slow = |_: &str, _: &str| {
        thread::sleep(Duration::from_millis(200));
        0.0
    };
    let intent = fixture
        .intent("intent-guard-pay", "Pay the monthly rent", payments_scope())
        .issued_at(iba::core::now_millis())
        .expires_in(HOUR)
        .sign(&fixture.keypair)
        .unwrap();
    let guard = IntentGuard::new(fixture.engine(intent, slow));

    let result = guard
        .validate(
            ActionRequest::new("transfer", "usdc_transfer").amount(70.0),
            Duration::from_millis(20),
        )
        .await;
    assert!(!result.allowed);
    assert_eq!(result.denial, Some(DenialReason::TimedOut { after_ms: 20 }));
    assert!(result.reason.contains("timed out"));

    // Let the abandoned validation reach the engine's decision point.
    let engine = guard.engine();
    for _ in 0..200 {
        if engine.stats().total_actions == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let history = engine.history();
    assert_eq!(history.len(), 1);
    assert!(!history[0].result.allowed);
    assert_eq!(history[0].result.denial, Some(DenialReason::TimedOut { after_ms: 20 }));
    assert_eq!(engine.ledger().used("usdc_transfer"), 0.0);
    assert_eq!(engine.stats().allowed, 0);
    assert_eq!(engine.status(), IntentStatus::Active);
}

#[tokio::test]
async fn guard_clones_share_one_engine() {
    let fixture = fixture();
    let guard = IntentGuard::new(fixture.engine(live_intent(&fixture), NoDrift));
    let other = guard.clone();

    let denied = other
        .validate(ActionRequest::new("pay", "payment:process"), Duration::from_secs(5))
        .await;
    assert!(!denied.allowed);

    let after = guard
        .validate(ActionRequest::new("read", "calendar:today"), Duration::from_secs(5))
        .await;
    assert_eq!(after.reason, "intent not active (revoked)");
    assert!(Arc::ptr_eq(guard.engine(), other.engine()));
    assert_eq!(guard.engine().status(), IntentStatus::Revoked);
}
