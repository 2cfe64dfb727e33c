//! Handlers: single-use terminal continuations.
//!
//! A [`Handler`] is the realized continuation of one initiated operation.
//! [`Handler::complete`] consumes it, so invoking a handler twice is not a
//! runtime error but an unrepresentable program. A handler that is dropped
//! without being invoked is *abandoned*; anything it owns (captured state,
//! retained guards) is released by ordinary drop glue on that path.
//!
//! [`Adapted`] is the adaptation wrapper: it owns a transform rule and the
//! inner handler, applies the rule to the raw payload, then forwards the
//! converted payload inward. Scheduling hints pass straight through to the
//! inner handler, untouched by adaptation.

use crate::signature::Signature;
use crate::transform::Transform;

/// A single-use continuation invoked with a completion payload.
pub trait Handler<S: Signature> {
    /// Delivers the completion, consuming the handler.
    fn complete(self, values: S::Values);

    /// Whether this continuation extends work already in flight.
    ///
    /// Executors may use this to run the continuation inline instead of
    /// scheduling it. Adapters must delegate to the handler they wrap.
    fn is_continuation(&self) -> bool {
        false
    }
}

/// A handler wrapping another handler behind a transform rule.
///
/// When invoked with the raw payload of signature `S`, it applies `R` and
/// forwards `R`'s output payload to the inner handler. If it is dropped
/// un-invoked, rule and inner handler drop with it, which is what releases
/// any guards the rule retains.
#[derive(Debug, Clone)]
pub struct Adapted<H, R> {
    inner: H,
    rule: R,
}

impl<H, R> Adapted<H, R> {
    /// Wraps `inner` behind `rule`.
    #[must_use]
    pub fn new(inner: H, rule: R) -> Self {
        Self { inner, rule }
    }
}

impl<S, H, R> Handler<S> for Adapted<H, R>
where
    S: Signature,
    R: Transform<S>,
    H: Handler<R::Output>,
{
    fn complete(self, values: S::Values) {
        let Self { inner, rule } = self;
        let transformed = rule.apply(values);
        inner.complete(transformed);
    }

    fn is_continuation(&self) -> bool {
        self.inner.is_continuation()
    }
}

/// A handler that delivers the payload to an owned closure.
///
/// `Callback` is also a completion token: passing it to an initiating
/// operation installs it directly as the handler.
#[derive(Debug, Clone)]
pub struct Callback<F> {
    f: F,
    continuation: bool,
}

impl<F> Callback<F> {
    /// A callback with no scheduling hint.
    #[must_use]
    pub fn new(f: F) -> Self {
        Self {
            f,
            continuation: false,
        }
    }

    /// A callback hinted as a continuation of work already in flight.
    #[must_use]
    pub fn continuation(f: F) -> Self {
        Self {
            f,
            continuation: true,
        }
    }
}

impl<S, F> Handler<S> for Callback<F>
where
    S: Signature,
    F: FnOnce(S::Values),
{
    fn complete(self, values: S::Values) {
        (self.f)(values);
    }

    fn is_continuation(&self) -> bool {
        self.continuation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Completion, ErrorKind, Fault};
    use crate::signature::{Bare, Fallible};
    use crate::transform::{AsCode, FailFast, Retain};
    use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
    use std::sync::Arc;

    fn deliver<S: Signature, H: Handler<S>>(handler: H, values: S::Values) {
        handler.complete(values);
    }

    struct ReleaseFlag(Arc<AtomicBool>);

    impl Drop for ReleaseFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[test]
    fn adapted_applies_rule_then_forwards() {
        let seen = Arc::new(AtomicU32::new(0));
        let sink = {
            let seen = Arc::clone(&seen);
            Callback::new(move |v: u32| seen.store(v, Ordering::SeqCst))
        };

        let adapted = Adapted::new(sink, FailFast);
        deliver::<Fallible<u32>, _>(adapted, Ok(17));

        assert_eq!(seen.load(Ordering::SeqCst), 17);
    }

    #[test]
    fn adapted_forwards_coded_errors() {
        let observed = Arc::new(AtomicBool::new(false));
        let sink = {
            let observed = Arc::clone(&observed);
            Callback::new(move |v: Result<u32, ErrorKind>| {
                assert_eq!(v, Err(ErrorKind::Cancelled));
                observed.store(true, Ordering::SeqCst);
            })
        };

        let adapted = Adapted::new(sink, AsCode);
        deliver::<Fallible<u32>, _>(adapted, Err(Fault::cancelled()));

        assert!(observed.load(Ordering::SeqCst));
    }

    #[test]
    fn handler_runs_exactly_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let sink = {
            let count = Arc::clone(&count);
            Callback::new(move |_: &str| {
                count.fetch_add(1, Ordering::SeqCst);
            })
        };

        deliver::<Bare<&str>, _>(sink, "done");

        // A second invocation does not typecheck; the count proves the one
        // allowed invocation ran.
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn continuation_hint_delegates_through_adaptation() {
        let hinted = Callback::continuation(|_: Completion<u32>| {});
        let adapted = Adapted::new(hinted, Retain::new(()));
        assert!(Handler::<Fallible<u32>>::is_continuation(&adapted));

        let plain = Callback::new(|_: Completion<u32>| {});
        let adapted = Adapted::new(plain, Retain::new(()));
        assert!(!Handler::<Fallible<u32>>::is_continuation(&adapted));
    }

    #[test]
    fn abandoned_adapter_still_releases_guards() {
        let released = Arc::new(AtomicBool::new(false));
        let sink = Callback::new(|_: Completion<u32>| panic!("handler must stay un-invoked"));
        let adapted = Adapted::new(sink, Retain::new(ReleaseFlag(Arc::clone(&released))));

        drop(adapted);

        assert!(released.load(Ordering::SeqCst));
    }
}
