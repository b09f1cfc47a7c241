//! Unit tests for the retry executor.

use std::time::{Duration, Instant};

use rstest::rstest;

use super::*;

#[derive(Debug, Eq, PartialEq)]
enum TestError {
    Terminal(&'static str),
    Timeout(RetryTimeout),
}

impl From<RetryTimeout> for TestError {
    fn from(value: RetryTimeout) -> Self {
        Self::Timeout(value)
    }
}

fn fast_retrier() -> Retrier {
    Retrier::new(Duration::from_millis(1), Duration::from_millis(4))
}

#[tokio::test]
async fn succeeds_after_three_retries() {
    let mut invocations = 0_u32;
    let result: Result<u32, TestError> = fast_retrier()
        .run("flaky operation", Duration::from_secs(5), |ctx| {
            invocations += 1;
            async move {
                if ctx.attempt() <= 3 {
                    Outcome::Retry
                } else {
                    Outcome::Success(ctx.attempt())
                }
            }
        })
        .await;

    assert_eq!(result, Ok(4));
    assert_eq!(invocations, 4);
}

#[tokio::test]
async fn returns_on_first_success_without_waiting() {
    let mut invocations = 0_u32;
    let result: Result<(), TestError> = Retrier::new(Duration::from_secs(60), Duration::from_secs(60))
        .run("immediate", Duration::from_secs(1), |_| {
            invocations += 1;
            async { Outcome::Success(()) }
        })
        .await;

    assert_eq!(result, Ok(()));
    assert_eq!(invocations, 1);
}

#[tokio::test]
async fn fail_stops_immediately() {
    let mut invocations = 0_u32;
    let result: Result<(), TestError> = fast_retrier()
        .run("doomed", Duration::from_secs(5), |_| {
            invocations += 1;
            async { Outcome::Fail(TestError::Terminal("bad request")) }
        })
        .await;

    assert_eq!(result, Err(TestError::Terminal("bad request")));
    assert_eq!(invocations, 1);
}

#[tokio::test]
async fn always_busy_times_out_close_to_the_deadline() {
    let timeout = Duration::from_millis(40);
    let started = Instant::now();
    let result: Result<(), TestError> = fast_retrier()
        .run("stuck", timeout, |_| async { Outcome::Retry })
        .await;
    let elapsed = started.elapsed();

    let Err(TestError::Timeout(err)) = result else {
        panic!("expected a retry timeout, got {result:?}");
    };
    assert_eq!(err.description, "stuck");
    assert!(err.attempts > 1, "expected several attempts: {err:?}");
    assert!(elapsed >= timeout, "gave up early after {elapsed:?}");
    assert!(
        elapsed < timeout + Duration::from_millis(500),
        "overran the deadline: {elapsed:?}"
    );
}

#[tokio::test]
async fn deadline_during_backoff_yields_single_timeout() {
    let mut invocations = 0_u32;
    let result: Result<(), TestError> = Retrier::new(Duration::from_secs(30), Duration::from_secs(30))
        .run("slow backoff", Duration::from_millis(20), |_| {
            invocations += 1;
            async { Outcome::Retry }
        })
        .await;

    assert!(matches!(result, Err(TestError::Timeout(_))));
    assert_eq!(invocations, 1, "body must not run again after the deadline");
}

#[rstest]
#[case(Ok(7), Outcome::Success(7))]
#[case(Err(ApiError::busy("deploying")), Outcome::Retry)]
#[case(
    Err(ApiError::response("INVALID_INPUT_DATA", "bad")),
    Outcome::Fail(String::from("INVALID_INPUT_DATA: bad"))
)]
fn classifies_api_results(
    #[case] result: Result<u32, ApiError>,
    #[case] expected: Outcome<u32, String>,
) {
    assert_eq!(
        Outcome::from_api_result(result, |err| err.to_string()),
        expected
    );
}

#[test]
fn max_delay_never_drops_below_initial_delay() {
    let retrier = Retrier::new(Duration::from_secs(10), Duration::from_secs(1));
    assert_eq!(retrier.max_delay, Duration::from_secs(10));
}
