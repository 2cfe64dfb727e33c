//! Signature transformation rules.
//!
//! A [`Transform`] maps one completion signature to another and carries the
//! value-level conversion that goes with it. Rules are selected entirely by
//! the type system: each rule implements `Transform<S>` once per input shape
//! it accepts, so there is no runtime branching on "does this signature have
//! an error slot".
//!
//! Three rules cover the layer:
//!
//! - [`FailFast`]: removes the error slot. An error reaching it means a
//!   caller asserted the operation cannot fail that way; the process is
//!   terminated rather than the error reported. Bare signatures pass
//!   through unchanged.
//! - [`AsCode`]: narrows the type-erased [`Fault`] slot to a structured
//!   [`ErrorKind`] code. Faults outside the [`Error`] family are treated the
//!   same as a [`FailFast`] violation. Already-coded and bare signatures
//!   pass through unchanged, so rules stack in either order.
//! - [`Retain`]: the identity on signatures; its whole effect is owning
//!   guard resources until the completion is delivered and releasing them
//!   first.
//!
//! A rule is consumed by [`Transform::apply`]. Rules are applied exactly
//! once per initiation, by the adapted handler that owns them.

use core::fmt;

use crate::error::{Completion, Error, ErrorKind, Fault};
use crate::signature::{Bare, Fallible, NoUnwind, Qualifier, Signature, Values};
use crate::tracing_compat::error;

/// Maps an input signature to an output signature, converting the payload.
pub trait Transform<S: Signature> {
    /// The signature the adapted completion advertises.
    type Output: Signature;

    /// Converts a raw payload into the advertised payload.
    fn apply(self, values: S::Values) -> Values<Self::Output>;
}

/// Terminates the process; completion errors past this point are bugs.
#[cold]
fn fatal(rule: &'static str, detail: &str) -> ! {
    error!(rule, detail, "unrecoverable completion error");
    eprintln!("fatal completion error ({rule}): {detail}");
    std::process::abort()
}

/// Removes the error slot by making errors fatal.
///
/// The output signature is qualified [`NoUnwind`]: with errors handled by
/// termination, the forwarded continuation has no error path left to unwind
/// through.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailFast;

impl<T, E: fmt::Debug, Q: Qualifier> Transform<Fallible<T, E, Q>> for FailFast {
    type Output = Bare<T, NoUnwind>;

    fn apply(self, values: Result<T, E>) -> T {
        match values {
            Ok(value) => value,
            Err(err) => fatal("fail-fast", &format!("{err:?}")),
        }
    }
}

impl<T, Q: Qualifier> Transform<Bare<T, Q>> for FailFast {
    type Output = Bare<T, Q>;

    fn apply(self, values: T) -> T {
        values
    }
}

/// Narrows the [`Fault`] slot to a structured [`ErrorKind`] code.
///
/// Only the [`Error`] family converts; any other fault is a contract
/// violation and fatal, never silently swallowed.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsCode;

impl<T, Q: Qualifier> Transform<Fallible<T, Fault, Q>> for AsCode {
    type Output = Fallible<T, ErrorKind, Q>;

    fn apply(self, values: Completion<T>) -> Result<T, ErrorKind> {
        match values {
            Ok(value) => Ok(value),
            Err(fault) => match fault.downcast::<Error>() {
                Ok(err) => Err(err.kind()),
                Err(other) => fatal("error-code", &other.message()),
            },
        }
    }
}

impl<T, Q: Qualifier> Transform<Fallible<T, ErrorKind, Q>> for AsCode {
    type Output = Fallible<T, ErrorKind, Q>;

    fn apply(self, values: Result<T, ErrorKind>) -> Result<T, ErrorKind> {
        values
    }
}

impl<T, Q: Qualifier> Transform<Bare<T, Q>> for AsCode {
    type Output = Bare<T, Q>;

    fn apply(self, values: T) -> T {
        values
    }
}

/// Owns guard resources until the completion is delivered.
///
/// Identity on the signature. The guards are released when the rule is
/// applied, before the payload is forwarded; if the owning handler is
/// dropped un-invoked instead, the guards drop with it. Either way there is
/// no path on which they outlive the completion.
#[derive(Debug, Clone)]
pub struct Retain<G>(G);

impl<G> Retain<G> {
    /// Wraps guard resources. Multiple guards compose as a tuple.
    #[must_use]
    pub fn new(guards: G) -> Self {
        Self(guards)
    }
}

impl<S: Signature, G> Transform<S> for Retain<G> {
    type Output = S;

    fn apply(self, values: S::Values) -> S::Values {
        let Self(guards) = self;
        drop(guards);
        values
    }
}
