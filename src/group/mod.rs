//! Parallel group combinators over heterogeneous members.
//!
//! This module provides the group families:
//!
//! - [`race2`]..[`race8`]: first settlement wins, losers cancelled
//! - [`all2`]..[`all8`]: wait for every value, first fault cancels the rest
//! - [`all_settled2`]..[`all_settled8`]: wait for every outcome, cancel nothing
//!
//! Every family spawns its members eagerly, in declaration order, onto the
//! executor it is given, and never resolves before each member has reached
//! a settlement of its own. Cancellation is an outcome like any other: a
//! cancelled member settles with a cancellation fault rather than silently
//! vanishing. Dropping a group future before it resolves cancels whatever
//! is still running.

pub mod all;
pub mod all_settled;
pub mod race;

mod slot;
mod wait;

pub use all::{all2, all3, all4, all5, all6, all7, all8};
pub use all_settled::{
    all_settled2, all_settled3, all_settled4, all_settled5, all_settled6, all_settled7,
    all_settled8,
};
pub use race::{
    race2, race3, race4, race5, race6, race7, race8, Winner2, Winner3, Winner4, Winner5, Winner6,
    Winner7, Winner8,
};
