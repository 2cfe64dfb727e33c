//! Completion tokens and token adaptation.
//!
//! A [`Token`] decides how an initiated operation delivers its completion:
//! invoke a closure ([`Callback`]), resolve a future ([`Promised`]), or
//! discard it ([`Detached`]). Adaptation wraps one token inside another with
//! [`Wrapped`], forming a chain whose innermost token is unchanged.
//!
//! # Initiation Recursion
//!
//! [`Token::initiate`] materializes the handler at the moment the operation
//! starts. A wrapped token delegates initiation inward and layers an
//! [`Adapted`] handler around whatever the inner token materializes, so the
//! chain is built exactly once per initiation:
//!
//! ```text
//! Promised.as_code().with_guard(g)        raw Result<T, Fault>
//!   |  each wrap delegates inward           |  Retain(g): guards released
//!   v                                       v
//! Promised materializes a Settler         AsCode: Fault -> ErrorKind
//!   and each wrap adds an adapter           |
//!                                           v
//!                                         Settler delivers Result<T, ErrorKind>
//! ```
//!
//! The raw payload always hits the most recently applied wrap first and the
//! base token observes the fully transformed signature.
//!
//! # Default Tokens
//!
//! [`WithDefault`] pairs an executor with the token to use when a call site
//! does not name one. It is an explicit value, not a type-level rebinding,
//! and stands in for its executor anywhere one is needed.

use core::fmt;
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};

use futures::channel::oneshot;
use futures::task::{FutureObj, Spawn, SpawnError};

use crate::handler::{Adapted, Callback, Handler};
use crate::signature::{Abandon, Signature};
use crate::tracing_compat::trace;
use crate::transform::{AsCode, FailFast, Retain, Transform};

/// A completion token: decides delivery and materializes the handler.
pub trait Token<S: Signature>: Sized {
    /// What initiation returns to the caller (a future, or nothing).
    type Output;
    /// The handler this token materializes.
    type Handler: Handler<S>;

    /// Begins an operation.
    ///
    /// `start` receives the materialized handler and is responsible for
    /// arranging its eventual invocation (or abandonment). Returns the
    /// token's delivery artifact.
    fn initiate<I: FnOnce(Self::Handler)>(self, start: I) -> Self::Output;
}

/// A token wrapping another token behind a transform rule.
///
/// Initiating a `Wrapped` token initiates the inner token against the
/// transformed signature and adapts the handler it materializes.
#[derive(Debug, Clone)]
pub struct Wrapped<T, R> {
    inner: T,
    rule: R,
}

impl<T, R> Wrapped<T, R> {
    /// Wraps `inner` behind `rule`.
    #[must_use]
    pub fn new(inner: T, rule: R) -> Self {
        Self { inner, rule }
    }
}

impl<S, T, R> Token<S> for Wrapped<T, R>
where
    S: Signature,
    R: Transform<S>,
    T: Token<R::Output>,
{
    type Output = T::Output;
    type Handler = Adapted<T::Handler, R>;

    fn initiate<I: FnOnce(Self::Handler)>(self, start: I) -> T::Output {
        let Self { inner, rule } = self;
        inner.initiate(move |handler| start(Adapted::new(handler, rule)))
    }
}

/// Adaptation combinators, available on any token.
///
/// Implemented blanket for every sized type; the wrap only becomes useful
/// (and only typechecks as a token) when `self` is itself a token for the
/// transformed signature.
pub trait TokenExt: Sized {
    /// Asserts the operation cannot fail: errors terminate the process and
    /// the completion delivers the bare value.
    #[must_use]
    fn fail_fast(self) -> Wrapped<Self, FailFast> {
        Wrapped::new(self, FailFast)
    }

    /// Delivers structured errors as [`ErrorKind`](crate::error::ErrorKind)
    /// codes instead of type-erased faults.
    #[must_use]
    fn as_code(self) -> Wrapped<Self, AsCode> {
        Wrapped::new(self, AsCode)
    }

    /// Attaches guard resources held until the completion is delivered.
    ///
    /// The signature is unchanged. Multiple guards compose as a tuple here
    /// or by stacking wraps.
    #[must_use]
    fn with_guard<G>(self, guards: G) -> Wrapped<Self, Retain<G>> {
        Wrapped::new(self, Retain::new(guards))
    }

    /// Installs this token as the default completion style for `executor`.
    #[must_use]
    fn as_default_on<E>(self, executor: E) -> WithDefault<E, Self> {
        WithDefault::new(executor, self)
    }
}

impl<T> TokenExt for T {}

impl<S, F> Token<S> for Callback<F>
where
    S: Signature,
    F: FnOnce(S::Values),
{
    type Output = ();
    type Handler = Self;

    fn initiate<I: FnOnce(Self::Handler)>(self, start: I) {
        start(self);
    }
}

/// The future-style token: initiation returns a [`Settlement`].
///
/// The handler side owns the sending half of a oneshot channel. If it is
/// dropped without being invoked, the settlement resolves with the shape's
/// abandonment payload instead of hanging.
#[derive(Debug, Clone, Copy, Default)]
pub struct Promised;

/// The handler materialized by [`Promised`].
pub struct Settler<S: Signature> {
    tx: oneshot::Sender<S::Values>,
}

impl<S: Signature> Handler<S> for Settler<S> {
    fn complete(self, values: S::Values) {
        // The receiving side may already be gone; nothing left to notify.
        let _ = self.tx.send(values);
    }
}

impl<S: Signature> fmt::Debug for Settler<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settler").finish_non_exhaustive()
    }
}

/// The future returned by initiating with [`Promised`].
///
/// Resolves with the completion payload, or with the shape's abandonment
/// payload if the handler was destroyed un-invoked.
pub struct Settlement<S: Signature> {
    rx: oneshot::Receiver<S::Values>,
}

impl<S> Future for Settlement<S>
where
    S: Signature + Abandon,
{
    type Output = S::Values;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        Pin::new(&mut this.rx)
            .poll(cx)
            .map(|delivered| delivered.unwrap_or_else(|_cancelled| S::abandoned()))
    }
}

impl<S: Signature> fmt::Debug for Settlement<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settlement").finish_non_exhaustive()
    }
}

impl<S: Signature> Token<S> for Promised {
    type Output = Settlement<S>;
    type Handler = Settler<S>;

    fn initiate<I: FnOnce(Self::Handler)>(self, start: I) -> Settlement<S> {
        let (tx, rx) = oneshot::channel();
        start(Settler { tx });
        Settlement { rx }
    }
}

/// Fire-and-forget: the completion payload is discarded.
#[derive(Debug, Clone, Copy, Default)]
pub struct Detached;

impl<S: Signature> Handler<S> for Detached {
    fn complete(self, _values: S::Values) {
        trace!("detached completion discarded");
    }
}

impl<S: Signature> Token<S> for Detached {
    type Output = ();
    type Handler = Self;

    fn initiate<I: FnOnce(Self::Handler)>(self, start: I) {
        start(self);
    }
}

/// An executor paired with the token used when a call site omits one.
///
/// Stands in for its executor: it forwards [`Spawn`] so APIs taking an
/// executor accept it unchanged, and `spawn` on it resolves the omitted
/// token to the carried default.
#[derive(Debug, Clone)]
pub struct WithDefault<E, T> {
    executor: E,
    token: T,
}

impl<E, T> WithDefault<E, T> {
    /// Pairs `executor` with default `token`.
    #[must_use]
    pub fn new(executor: E, token: T) -> Self {
        Self { executor, token }
    }

    /// Borrows the underlying executor.
    #[must_use]
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Clones out a fresh copy of the default token for explicit use.
    #[must_use]
    pub fn issue(&self) -> T
    where
        T: Clone,
    {
        self.token.clone()
    }

    /// Splits back into executor and token.
    #[must_use]
    pub fn into_parts(self) -> (E, T) {
        (self.executor, self.token)
    }
}

impl<E: Spawn, T> Spawn for WithDefault<E, T> {
    fn spawn_obj(&self, future: FutureObj<'static, ()>) -> Result<(), SpawnError> {
        self.executor.spawn_obj(future)
    }

    fn status(&self) -> Result<(), SpawnError> {
        self.executor.status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Completion, ErrorKind, Fault};
    use crate::signature::Fallible;
    use futures::executor::block_on;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use std::sync::Arc;

    fn initiate_with<S: Signature, T: Token<S>>(token: T, values: S::Values) -> T::Output {
        token.initiate(|handler| handler.complete(values))
    }

    struct ReleaseFlag(Arc<AtomicBool>);

    impl Drop for ReleaseFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[test]
    fn callback_token_installs_itself() {
        let seen = Arc::new(AtomicU32::new(0));
        let sink = {
            let seen = Arc::clone(&seen);
            Callback::new(move |v: Completion<u32>| seen.store(v.unwrap(), Ordering::SeqCst))
        };

        initiate_with::<Fallible<u32>, _>(sink, Ok(4));

        assert_eq!(seen.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn wrapped_token_rewrites_the_declared_signature() {
        let seen = Arc::new(AtomicU32::new(0));
        let sink = {
            let seen = Arc::clone(&seen);
            // The callback observes the bare value; the error slot is gone.
            Callback::new(move |v: u32| seen.store(v, Ordering::SeqCst))
        };

        initiate_with::<Fallible<u32>, _>(sink.fail_fast(), Ok(17));

        assert_eq!(seen.load(Ordering::SeqCst), 17);
    }

    #[test]
    fn as_code_token_delivers_kinds() {
        let seen = Arc::new(AtomicBool::new(false));
        let sink = {
            let seen = Arc::clone(&seen);
            Callback::new(move |v: Result<u32, ErrorKind>| {
                assert_eq!(v, Err(ErrorKind::Cancelled));
                seen.store(true, Ordering::SeqCst);
            })
        };

        initiate_with::<Fallible<u32>, _>(sink.as_code(), Err(Fault::cancelled()));

        assert!(seen.load(Ordering::SeqCst));
    }

    #[test]
    fn stacked_wraps_compose() {
        let seen = Arc::new(AtomicU32::new(0));
        let sink = {
            let seen = Arc::clone(&seen);
            Callback::new(move |v: u32| seen.store(v, Ordering::SeqCst))
        };

        // Raw fault channel -> coded by the outer wrap -> bare via the
        // inner fail-fast wrap.
        initiate_with::<Fallible<u32>, _>(sink.fail_fast().as_code(), Ok(21));

        assert_eq!(seen.load(Ordering::SeqCst), 21);
    }

    #[test]
    fn guard_token_releases_on_delivery() {
        let released = Arc::new(AtomicBool::new(false));
        let seen = Arc::new(AtomicU32::new(0));
        let sink = {
            let seen = Arc::clone(&seen);
            Callback::new(move |v: Completion<u32>| seen.store(v.unwrap(), Ordering::SeqCst))
        };
        let token = sink.with_guard(ReleaseFlag(Arc::clone(&released)));

        initiate_with::<Fallible<u32>, _>(token, Ok(5));

        assert_eq!(seen.load(Ordering::SeqCst), 5);
        assert!(released.load(Ordering::SeqCst));
    }

    #[test]
    fn promised_token_settles_a_future() {
        let settlement = initiate_with::<Fallible<u32>, _>(Promised, Ok(11));
        let outcome = block_on(settlement);
        assert_eq!(outcome.unwrap(), 11);
    }

    #[test]
    fn promised_abandonment_resolves_instead_of_hanging() {
        let settlement = <Promised as Token<Fallible<u32>>>::initiate(Promised, drop);
        let outcome = block_on(settlement);
        let fault = outcome.unwrap_err();
        assert_eq!(fault.code(), Some(ErrorKind::Abandoned));
    }

    #[test]
    fn promised_abandonment_through_as_code() {
        let settlement = <Wrapped<Promised, AsCode> as Token<Fallible<u32>>>::initiate(
            Promised.as_code(),
            drop,
        );
        let outcome = block_on(settlement);
        assert_eq!(outcome, Err(ErrorKind::Abandoned));
    }

    #[test]
    fn detached_discards_the_payload() {
        initiate_with::<Fallible<u32>, _>(Detached, Ok(2));
        initiate_with::<Fallible<u32>, _>(Detached, Err(Fault::from("ignored")));
    }

    #[test]
    fn with_default_issues_fresh_tokens() {
        struct NoExec;
        let bound = Promised.as_code().as_default_on(NoExec);

        let token = bound.issue();
        let settlement =
            <Wrapped<Promised, AsCode> as Token<Fallible<u32>>>::initiate(token, |handler| {
                Handler::<Fallible<u32>>::complete(handler, Err(Fault::cancelled()));
            });

        assert_eq!(block_on(settlement), Err(ErrorKind::Cancelled));
    }
}
