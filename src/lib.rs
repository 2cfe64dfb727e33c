//! Settle: completion-token adaptation and heterogeneous parallel groups for async Rust.
//!
//! # Overview
//!
//! Settle decouples how an async operation reports its completion from how
//! the operation runs. A completion token chooses the delivery mechanism
//! (invoke a callback, resolve an awaitable settlement, discard silently),
//! transformation rules rewrite completion signatures before delivery, and
//! parallel group combinators run independently typed operations side by
//! side under a policy that decides when the stragglers are cancelled.
//!
//! # Core Guarantees
//!
//! - **Every member settles**: a group combinator never resolves while any member is unaccounted for
//! - **Cancellation is an outcome**: a cancelled operation reports a cancellation fault, never silence
//! - **Abandonment is observable**: a handler destroyed un-invoked delivers an abandonment fault inward
//! - **Unrecoverable means stop**: fail-fast transforms terminate the process rather than invent a value
//!
//! # Module Structure
//!
//! - [`signature`]: Completion signature shapes and their qualifiers
//! - [`transform`]: Rules that rewrite completion values between shapes
//! - [`handler`]: Completion handlers and handler adaptation
//! - [`token`]: Completion tokens, delivery styles, and token adaptation
//! - [`spawn`]: Bridging suspended computations onto an executor
//! - [`group`]: Race, all, and all-settled parallel combinators
//! - [`error`]: Error types
//! - [`tracing_compat`]: Tracing macros with a no-op fallback
//! - [`test_utils`]: Shared test helpers

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
// Arity-eight combinators need wide argument lists and tuple types
#![allow(clippy::too_many_arguments)]
#![allow(clippy::type_complexity)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]

pub mod error;
pub mod group;
pub mod handler;
pub mod signature;
pub mod spawn;
pub mod test_utils;
pub mod token;
pub mod tracing_compat;
pub mod transform;

// Re-exports for convenient access to core types
pub use error::{Completion, Error, ErrorCategory, ErrorKind, Fault, Recoverability};
pub use group::{
    all2, all3, all4, all5, all6, all7, all8, all_settled2, all_settled3, all_settled4,
    all_settled5, all_settled6, all_settled7, all_settled8, race2, race3, race4, race5, race6,
    race7, race8, Winner2, Winner3, Winner4, Winner5, Winner6, Winner7, Winner8,
};
pub use handler::{Adapted, Callback, Handler};
pub use signature::{Abandon, Bare, Fallible, NoUnwind, Ordinary, Qualifier, Signature, Values};
pub use spawn::spawn_with;
pub use token::{Detached, Promised, Settlement, Settler, Token, TokenExt, WithDefault, Wrapped};
pub use transform::{AsCode, FailFast, Retain, Transform};
