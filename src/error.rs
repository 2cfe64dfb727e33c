//! Error types and error handling strategy for the completion layer.
//!
//! This module defines the error types shared by the adaptation wrappers and
//! the parallel group combinators. Error handling follows these principles:
//!
//! - Errors are explicit and typed (no stringly-typed errors)
//! - A suspended computation resolves exactly once, with a value or a
//!   [`Fault`]; cancellation is an error outcome, not a separate channel
//! - The structured [`Error`] family carries an [`ErrorKind`] code; anything
//!   outside the family stays opaque inside a [`Fault`]
//! - Errors are classified by recoverability for retry logic layered above
//!
//! # Error Categories
//!
//! - **Cancellation**: Operation cancelled before it could complete
//! - **Execution**: The executor failed to run or finish the operation
//! - **Internal**: Bugs and invalid states in this crate
//! - **User**: Errors originating in caller-supplied code
//!
//! # Recovery Classification
//!
//! All kinds classify under [`Recoverability`]:
//! - `Transient`: Temporary failure, safe to retry
//! - `Permanent`: Unrecoverable, do not retry
//! - `Unknown`: Recoverability depends on context

use core::fmt;
use std::sync::Arc;

/// The kind of error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    // === Cancellation ===
    /// Operation was cancelled before completing.
    Cancelled,

    // === Execution ===
    /// The completion handler was destroyed without ever being invoked.
    Abandoned,
    /// The executor refused to accept the task.
    SpawnRejected,

    // === Internal ===
    /// Internal invariant violation (bug).
    Internal,

    // === User ===
    /// Error originating in caller-supplied code.
    User,
}

impl ErrorKind {
    /// Returns the error category for this kind.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Cancelled => ErrorCategory::Cancellation,
            Self::Abandoned | Self::SpawnRejected => ErrorCategory::Execution,
            Self::Internal => ErrorCategory::Internal,
            Self::User => ErrorCategory::User,
        }
    }

    /// Returns the recoverability classification for this error kind.
    ///
    /// This helps retry logic built on top of the combinators decide whether
    /// to attempt recovery.
    #[must_use]
    pub const fn recoverability(&self) -> Recoverability {
        match self {
            // Transient errors - safe to retry
            Self::SpawnRejected => Recoverability::Transient,

            // Permanent errors - do not retry
            Self::Cancelled | Self::Abandoned | Self::Internal => Recoverability::Permanent,

            // Context-dependent errors
            Self::User => Recoverability::Unknown,
        }
    }

    /// Returns true if this error is typically retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.recoverability(), Recoverability::Transient)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl std::error::Error for ErrorKind {}

/// Classification of error recoverability for retry logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Recoverability {
    /// Temporary failure that may succeed on retry.
    Transient,
    /// Permanent failure that will not succeed on retry.
    Permanent,
    /// Recoverability depends on context and cannot be determined
    /// from the error kind alone.
    Unknown,
}

impl Recoverability {
    /// Returns true if this error is safe to retry.
    #[must_use]
    pub const fn should_retry(&self) -> bool {
        matches!(self, Self::Transient)
    }

    /// Returns true if this error should never be retried.
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        matches!(self, Self::Permanent)
    }
}

/// High-level error category for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Cancellation-related failures.
    Cancellation,
    /// Executor and task lifecycle failures.
    Execution,
    /// Internal errors in this crate.
    Internal,
    /// User-originated errors.
    User,
}

/// The structured error family for completion-layer operations.
///
/// These are the errors the error-code adapter recognizes: it reduces an
/// `Error` inside a [`Fault`] to its [`ErrorKind`]. Errors outside this
/// family are treated as programming-invariant violations at that boundary.
#[derive(Debug, Clone)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub const fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            source: None,
        }
    }

    /// Returns the error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns true if this error represents cancellation.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self.kind, ErrorKind::Cancelled)
    }

    /// Adds a message description to the error.
    #[must_use]
    pub fn with_message(mut self, msg: impl Into<String>) -> Self {
        self.message = Some(msg.into());
        self
    }

    /// Adds a source error to the chain.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    /// Creates a cancellation error.
    #[must_use]
    pub const fn cancelled() -> Self {
        Self::new(ErrorKind::Cancelled)
    }

    /// Creates an abandonment error: the handler was dropped un-invoked.
    #[must_use]
    pub const fn abandoned() -> Self {
        Self::new(ErrorKind::Abandoned)
    }

    /// Creates a spawn rejection error.
    #[must_use]
    pub const fn spawn_rejected() -> Self {
        Self::new(ErrorKind::SpawnRejected)
    }

    /// Creates an internal error (bug).
    #[must_use]
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal).with_message(detail)
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    /// Returns the recoverability classification.
    #[must_use]
    pub const fn recoverability(&self) -> Recoverability {
        self.kind.recoverability()
    }

    /// Returns the error message, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(msg) = &self.message {
            write!(f, ": {msg}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as _)
    }
}

/// A type-erased error outcome of a suspended computation.
///
/// `Fault` is the single error channel every operation resolves through:
/// member futures, the promise-style token, and the group combinators all
/// report failure as a `Fault`. Structured [`Error`] values remain
/// downcastable inside it, which is what [`Fault::code`] and the error-code
/// adapter rely on; any other `std::error::Error` travels through unchanged.
#[derive(Debug)]
pub struct Fault(Box<dyn std::error::Error + Send + Sync + 'static>);

impl Fault {
    /// Wraps an arbitrary error.
    pub fn new(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Box::new(err))
    }

    /// Creates a cancellation fault.
    #[must_use]
    pub fn cancelled() -> Self {
        Self::new(Error::cancelled())
    }

    /// Creates an abandonment fault.
    #[must_use]
    pub fn abandoned() -> Self {
        Self::new(Error::abandoned())
    }

    /// Returns the rendered message of the underlying error.
    #[must_use]
    pub fn message(&self) -> String {
        self.0.to_string()
    }

    /// Returns true if the underlying error is of type `E`.
    #[must_use]
    pub fn is<E: std::error::Error + 'static>(&self) -> bool {
        self.0.is::<E>()
    }

    /// Borrows the underlying error as `E`, if it is one.
    #[must_use]
    pub fn downcast_ref<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.0.downcast_ref::<E>()
    }

    /// Recovers the underlying error as `E`, or returns `self` unchanged.
    ///
    /// # Errors
    ///
    /// Returns the original fault when the underlying error is not an `E`.
    pub fn downcast<E: std::error::Error + 'static>(self) -> Result<E, Self> {
        match self.0.downcast::<E>() {
            Ok(err) => Ok(*err),
            Err(other) => Err(Self(other)),
        }
    }

    /// Returns the structured error code, if this fault carries a family
    /// [`Error`].
    #[must_use]
    pub fn code(&self) -> Option<ErrorKind> {
        self.downcast_ref::<Error>().map(Error::kind)
    }

    /// Returns true if this fault is a family cancellation error.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self.code(), Some(ErrorKind::Cancelled))
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for Fault {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl From<Error> for Fault {
    fn from(err: Error) -> Self {
        Self::new(err)
    }
}

impl From<String> for Fault {
    fn from(msg: String) -> Self {
        Self::new(Error::new(ErrorKind::User).with_message(msg))
    }
}

impl From<&str> for Fault {
    fn from(msg: &str) -> Self {
        Self::new(Error::new(ErrorKind::User).with_message(msg))
    }
}

/// The outcome type of a suspended computation: a value or a [`Fault`].
pub type Completion<T> = core::result::Result<T, Fault>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[derive(Debug)]
    struct Underlying;

    impl fmt::Display for Underlying {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "underlying")
        }
    }

    impl std::error::Error for Underlying {}

    #[test]
    fn display_without_message() {
        let err = Error::new(ErrorKind::Internal);
        assert_eq!(err.to_string(), "Internal");
    }

    #[test]
    fn display_with_message() {
        let err = Error::new(ErrorKind::User).with_message("boom");
        assert_eq!(err.to_string(), "User: boom");
    }

    #[test]
    fn source_chain_is_exposed() {
        let err = Error::new(ErrorKind::User)
            .with_message("outer")
            .with_source(Underlying);
        let source = err.source().expect("source missing");
        assert_eq!(source.to_string(), "underlying");
    }

    #[test]
    fn predicates_match_kind() {
        let cancel = Error::cancelled();
        assert!(cancel.is_cancelled());

        let abandoned = Error::abandoned();
        assert!(!abandoned.is_cancelled());
        assert_eq!(abandoned.kind(), ErrorKind::Abandoned);
    }

    #[test]
    fn categories_cover_kinds() {
        assert_eq!(ErrorKind::Cancelled.category(), ErrorCategory::Cancellation);
        assert_eq!(ErrorKind::Abandoned.category(), ErrorCategory::Execution);
        assert_eq!(
            ErrorKind::SpawnRejected.category(),
            ErrorCategory::Execution
        );
        assert_eq!(ErrorKind::Internal.category(), ErrorCategory::Internal);
        assert_eq!(ErrorKind::User.category(), ErrorCategory::User);
    }

    #[test]
    fn recoverability_classification() {
        assert!(ErrorKind::SpawnRejected.is_retryable());
        assert!(ErrorKind::Cancelled.recoverability().is_permanent());
        assert_eq!(ErrorKind::User.recoverability(), Recoverability::Unknown);
    }

    #[test]
    fn fault_exposes_family_code() {
        let fault = Fault::cancelled();
        assert_eq!(fault.code(), Some(ErrorKind::Cancelled));
        assert!(fault.is_cancelled());
    }

    #[test]
    fn fault_outside_family_has_no_code() {
        let fault = Fault::new(Underlying);
        assert_eq!(fault.code(), None);
        assert!(!fault.is_cancelled());
        assert!(fault.is::<Underlying>());
    }

    #[test]
    fn fault_downcast_round_trip() {
        let fault = Fault::new(Error::internal("invariant"));
        let err = fault.downcast::<Error>().expect("family error expected");
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.message(), Some("invariant"));
    }

    #[test]
    fn fault_downcast_miss_returns_original() {
        let fault = Fault::new(Underlying);
        let back = fault.downcast::<Error>().expect_err("not a family error");
        assert!(back.is::<Underlying>());
    }

    #[test]
    fn fault_from_str_is_user_kind() {
        let fault = Fault::from("something went sideways");
        assert_eq!(fault.code(), Some(ErrorKind::User));
        assert_eq!(fault.message(), "User: something went sideways");
    }
}
