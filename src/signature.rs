//! Completion signatures as type-level values.
//!
//! A completion signature describes what a terminal continuation receives
//! when an asynchronous operation finishes. Signatures exist only at the
//! type level: the marker types here are never instantiated, they select
//! trait impls. Two shapes cover the layer:
//!
//! - [`Fallible<T, E, Q>`]: an error slot first, then the value. The payload
//!   a handler receives is `Result<T, E>`.
//! - [`Bare<T, Q>`]: no error slot. The payload is `T` itself.
//!
//! The qualifier parameter `Q` is orthogonal to the value shape and records
//! whether the continuation runs under ordinary unwinding rules
//! ([`Ordinary`]) or is promised not to unwind ([`NoUnwind`]). Transform
//! rules that remove the error slot by making errors fatal produce
//! `NoUnwind` outputs; everything else preserves the input qualifier.
//!
//! [`Abandon`] extends a signature with its abandonment payload: the value a
//! promise-style delivery resolves with when the handler is destroyed
//! without ever being invoked.

use core::marker::PhantomData;

use crate::error::{ErrorKind, Fault};

/// Execution qualifier of a completion signature.
pub trait Qualifier {}

/// Ordinary execution: the continuation may unwind.
#[derive(Debug, Clone, Copy)]
pub struct Ordinary;

/// The continuation is promised not to unwind.
///
/// Produced by the fail-fast transform, which replaces error reporting with
/// process termination and therefore leaves the success path nothing to
/// unwind about.
#[derive(Debug, Clone, Copy)]
pub struct NoUnwind;

impl Qualifier for Ordinary {}
impl Qualifier for NoUnwind {}

/// A completion signature: the shape of values a handler is invoked with.
pub trait Signature {
    /// The payload a handler for this signature receives.
    type Values;
    /// The execution qualifier.
    type Qual: Qualifier;
}

/// Shorthand for the payload type of a signature.
pub type Values<S> = <S as Signature>::Values;

/// A signature with an error slot: the handler receives `Result<T, E>`.
///
/// The error slot always comes first in the abstract shape, which in the
/// `Result` rendering means the `Err` branch carries it. `E` defaults to
/// [`Fault`], the layer's type-erased error channel; the error-code adapter
/// narrows it to [`ErrorKind`].
pub struct Fallible<T, E = Fault, Q = Ordinary>(PhantomData<fn(T, E, Q)>);

impl<T, E, Q: Qualifier> Signature for Fallible<T, E, Q> {
    type Values = Result<T, E>;
    type Qual = Q;
}

/// A signature without an error slot: the handler receives `T` directly.
pub struct Bare<T, Q = Ordinary>(PhantomData<fn(T, Q)>);

impl<T, Q: Qualifier> Signature for Bare<T, Q> {
    type Values = T;
    type Qual = Q;
}

/// A signature that defines what an abandoned completion resolves with.
///
/// Abandonment means the handler was dropped without being invoked: the
/// operation was destroyed mid-flight, the executor rejected its driver
/// task, or the driver itself was dropped. Promise-style deliveries use
/// this to resolve rather than hang.
pub trait Abandon: Signature {
    /// The payload delivered in place of a real completion.
    fn abandoned() -> Self::Values;
}

impl<T, Q: Qualifier> Abandon for Fallible<T, Fault, Q> {
    fn abandoned() -> Self::Values {
        Err(Fault::abandoned())
    }
}

impl<T, Q: Qualifier> Abandon for Fallible<T, ErrorKind, Q> {
    fn abandoned() -> Self::Values {
        Err(ErrorKind::Abandoned)
    }
}

impl<T, Q: Qualifier> Abandon for Bare<T, Q> {
    /// Bare signatures have no error slot to report through.
    ///
    /// # Panics
    ///
    /// Always. An abandoned bare completion has no representable outcome.
    fn abandoned() -> Self::Values {
        panic!("async operation abandoned a bare completion handler")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Completion;

    fn payload_of<S: Signature>(values: S::Values) -> S::Values {
        values
    }

    #[test]
    fn fallible_payload_is_result() {
        let ok: Completion<u32> = payload_of::<Fallible<u32>>(Ok(7));
        assert_eq!(ok.unwrap(), 7);

        let coded = payload_of::<Fallible<u32, ErrorKind>>(Err(ErrorKind::Cancelled));
        assert_eq!(coded.unwrap_err(), ErrorKind::Cancelled);
    }

    #[test]
    fn bare_payload_is_plain_value() {
        let v = payload_of::<Bare<&str>>("done");
        assert_eq!(v, "done");
    }

    #[test]
    fn fallible_abandonment_is_a_fault() {
        let values = <Fallible<u32> as Abandon>::abandoned();
        let fault = values.unwrap_err();
        assert_eq!(fault.code(), Some(ErrorKind::Abandoned));
    }

    #[test]
    fn coded_abandonment_is_a_kind() {
        let values = <Fallible<u32, ErrorKind> as Abandon>::abandoned();
        assert_eq!(values.unwrap_err(), ErrorKind::Abandoned);
    }

    #[test]
    #[should_panic(expected = "bare completion handler")]
    fn bare_abandonment_panics() {
        let _ = <Bare<u32> as Abandon>::abandoned();
    }
}
