use std::time::Duration;
use studyplan_lib::content::breaker::{CircuitBreaker, ExponentialBackoff};

#[test]
fn test_circuit_breaker_initial_state() {
    let cb = CircuitBreaker::new(Duration::from_secs(60), 3);
    assert!(!cb.is_open());
    assert_eq!(cb.failure_count(), 0);
}

#[test]
fn test_circuit_breaker_opens_after_threshold() {
    let cb = CircuitBreaker::new(Duration::from_secs(60), 3);

    cb.record_failure();
    assert!(!cb.is_open());

    cb.record_failure();
    assert!(!cb.is_open());

    cb.record_failure();
    assert!(cb.is_open());
}

#[test]
fn test_circuit_breaker_resets_on_success() {
    let cb = CircuitBreaker::new(Duration::from_secs(60), 3);

    cb.record_failure();
    cb.record_failure();
    cb.record_success();

    assert!(!cb.is_open());
    assert_eq!(cb.failure_count(), 0);
}

#[test]
fn test_half_open_after_cooldown() {
    let cb = CircuitBreaker::new(Duration::from_millis(20), 2);
    cb.record_failure();
    cb.record_failure();
    assert!(cb.is_open());

    std::thread::sleep(Duration::from_millis(40));
    assert!(!cb.is_open());

    // a failed trial call reopens immediately
    cb.record_failure();
    assert!(cb.is_open());
}

#[test]
fn test_exponential_backoff() {
    let backoff = ExponentialBackoff::new(Duration::from_millis(100), Duration::from_secs(5));

    assert_eq!(backoff.base_delay(0), Duration::from_millis(100));
    assert_eq!(backoff.base_delay(1), Duration::from_millis(200));
    assert_eq!(backoff.base_delay(2), Duration::from_millis(400));
    assert_eq!(backoff.base_delay(10), Duration::from_secs(5));
    assert_eq!(backoff.base_delay(40), Duration::from_secs(5));

    for attempt in 0..5 {
        let base = backoff.base_delay(attempt);
        let delay = backoff.delay_for_attempt(attempt);
        assert!(delay >= base);
        assert!(delay <= base + base / 5);
    }
}
