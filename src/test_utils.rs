//! Test utilities for Settle.
//!
//! This module provides shared helpers for unit and integration tests:
//! - Consistent tracing-based logging initialization
//! - Phase/section macros for readable test output
//! - A single-threaded async test runner with a spawner
//! - Probe futures for observing polls, yields, and drops
//! - Fault assertion macros
//!
//! # Example
//! ```
//! use settle::group::race2;
//! use settle::test_utils::{init_test_logging, run_test};
//!
//! init_test_logging();
//! run_test(|spawner| async move {
//!     let winner = race2(&spawner, async { Ok(1_u32) }, async { Ok(2_u32) }).await;
//!     assert!(winner.is_ok());
//! });
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::task::{Context, Poll};

use futures::executor::{LocalPool, LocalSpawner};
use tracing_subscriber::fmt::format::FmtSpan;

static INIT_LOGGING: Once = Once::new();

/// Initialize test logging with trace-level output.
///
/// Safe to call multiple times; only initializes once.
pub fn init_test_logging() {
    init_test_logging_with_level(tracing::Level::TRACE);
}

/// Initialize test logging with a custom level.
///
/// The first call wins; later calls are no-ops.
pub fn init_test_logging_with_level(level: tracing::Level) {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_test_writer()
            .with_file(true)
            .with_line_number(true)
            .with_target(true)
            .with_thread_ids(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_ansi(false)
            .try_init();
    });
}

/// Run async test code on a fresh single-threaded pool.
///
/// The closure receives a spawner for the pool driving it, so tests can
/// hand the same executor to the operations they exercise. The pool runs
/// until the returned future resolves; spawned tasks make progress
/// whenever the test future awaits.
pub fn run_test<F, Fut>(f: F)
where
    F: FnOnce(LocalSpawner) -> Fut,
    Fut: Future<Output = ()>,
{
    init_test_logging();
    let mut pool = LocalPool::new();
    let spawner = pool.spawner();
    pool.run_until(f(spawner));
}

/// Yields to the executor exactly once before resolving.
#[must_use]
pub fn yield_now() -> YieldNow {
    YieldNow::default()
}

/// Future returned by [`yield_now`].
#[derive(Debug, Default)]
pub struct YieldNow {
    yielded: bool,
}

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.yielded {
            Poll::Ready(())
        } else {
            self.yielded = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

/// A future that resolves after a fixed number of polls, waking itself
/// between polls, and counts how often it was polled.
#[derive(Debug)]
pub struct CountingFuture {
    remaining: u32,
    polls: Arc<AtomicUsize>,
}

impl CountingFuture {
    /// Creates a future that returns `Pending` the given number of times
    /// before resolving.
    #[must_use]
    pub fn new(pending_polls: u32) -> Self {
        Self {
            remaining: pending_polls,
            polls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared counter of how many times this future has been polled.
    #[must_use]
    pub fn poll_count(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.polls)
    }
}

impl Future for CountingFuture {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        if self.remaining == 0 {
            Poll::Ready(())
        } else {
            self.remaining -= 1;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

/// A pending future that records its own drop.
///
/// Lets a test observe that a cancelled operation was actually destroyed
/// rather than leaked: the probe never resolves, so the flag can only be
/// set by the drop path.
#[derive(Debug)]
pub struct DropProbe {
    dropped: Arc<AtomicBool>,
}

impl DropProbe {
    /// Creates a probe whose flag starts unset.
    #[must_use]
    pub fn new() -> Self {
        Self {
            dropped: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shared flag set when the probe is dropped.
    #[must_use]
    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.dropped)
    }
}

impl Default for DropProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl Future for DropProbe {
    type Output = ();

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<()> {
        Poll::Pending
    }
}

impl Drop for DropProbe {
    fn drop(&mut self) {
        self.dropped.store(true, Ordering::SeqCst);
    }
}

/// Log a test phase transition with a visual separator.
#[macro_export]
macro_rules! test_phase {
    ($name:expr) => {
        tracing::info!(phase = %$name, "========================================");
        tracing::info!(phase = %$name, "TEST PHASE: {}", $name);
        tracing::info!(phase = %$name, "========================================");
    };
}

/// Log a section within a test phase.
#[macro_export]
macro_rules! test_section {
    ($name:expr) => {
        tracing::debug!(section = %$name, "--- {} ---", $name);
    };
}

/// Log test completion with summary.
#[macro_export]
macro_rules! test_complete {
    ($name:expr) => {
        tracing::info!(test = %$name, "test completed successfully: {}", $name);
    };
    ($name:expr, $($key:ident = $value:expr),* $(,)?) => {
        tracing::info!(
            test = %$name,
            $($key = %$value,)*
            "test completed successfully: {}",
            $name
        );
    };
}

/// Assert that a completion is a fault carrying a specific code.
#[macro_export]
macro_rules! assert_fault_kind {
    ($completion:expr, $kind:expr) => {
        match $completion {
            Err(fault) => {
                let code = fault.code();
                assert_eq!(code, Some($kind), "fault carried {code:?}");
            }
            Ok(value) => unreachable!("expected a fault of kind {:?}, got Ok({value:?})", $kind),
        }
    };
}
