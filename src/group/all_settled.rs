//! Join combinators that report every outcome.
//!
//! `all_settledN` spawns N independently-typed suspended computations onto
//! one executor and waits for all of them unconditionally. Nothing is ever
//! cancelled on a fault; each member runs to its own settlement and the
//! caller receives one [`Completion`] per member, in declaration order.

use core::future::Future;

use futures::task::Spawn;

use super::slot::slot_width;
use super::wait::{launch_member, new_group, WaitPolicy};
use crate::error::Completion;

macro_rules! define_all_settled {
    (
        $(#[$meta:meta])*
        $name:ident;
        $(($f:ident, $fut:ident, $t:ident, $idx:tt)),+
    ) => {
        $(#[$meta])*
        #[must_use]
        pub fn $name<Sp, $($fut, $t),+>(
            spawner: &Sp,
            $($f: $fut),+
        ) -> impl Future<Output = ($(Completion<$t>),+)> + Send
        where
            Sp: Spawn,
            $(
                $fut: Future<Output = Completion<$t>> + Send + 'static,
                $t: Send + 'static,
            )+
        {
            let widths = [$(slot_width::<$t>()),+];
            let (core, wait) = new_group(&widths, WaitPolicy::All);
            $(launch_member(spawner, &core, $idx, $f);)+
            async move {
                let mut settled = wait.await;
                ($(settled.take::<$t>($idx)),+)
            }
        }
    };
}

define_all_settled! {
    /// Joins two members and reports both outcomes.
    ///
    /// Members are spawned in declaration order on `spawner`. Faults do not
    /// cancel anything; the resolved tuple carries each member's own
    /// settlement, value or fault, in declaration order.
    all_settled2;
    (f0, F0, T0, 0),
    (f1, F1, T1, 1)
}

define_all_settled! {
    /// Like [`all_settled2`] with three members.
    all_settled3;
    (f0, F0, T0, 0),
    (f1, F1, T1, 1),
    (f2, F2, T2, 2)
}

define_all_settled! {
    /// Like [`all_settled2`] with four members.
    all_settled4;
    (f0, F0, T0, 0),
    (f1, F1, T1, 1),
    (f2, F2, T2, 2),
    (f3, F3, T3, 3)
}

define_all_settled! {
    /// Like [`all_settled2`] with five members.
    all_settled5;
    (f0, F0, T0, 0),
    (f1, F1, T1, 1),
    (f2, F2, T2, 2),
    (f3, F3, T3, 3),
    (f4, F4, T4, 4)
}

define_all_settled! {
    /// Like [`all_settled2`] with six members.
    all_settled6;
    (f0, F0, T0, 0),
    (f1, F1, T1, 1),
    (f2, F2, T2, 2),
    (f3, F3, T3, 3),
    (f4, F4, T4, 4),
    (f5, F5, T5, 5)
}

define_all_settled! {
    /// Like [`all_settled2`] with seven members.
    all_settled7;
    (f0, F0, T0, 0),
    (f1, F1, T1, 1),
    (f2, F2, T2, 2),
    (f3, F3, T3, 3),
    (f4, F4, T4, 4),
    (f5, F5, T5, 5),
    (f6, F6, T6, 6)
}

define_all_settled! {
    /// Like [`all_settled2`] with eight members.
    all_settled8;
    (f0, F0, T0, 0),
    (f1, F1, T1, 1),
    (f2, F2, T2, 2),
    (f3, F3, T3, 3),
    (f4, F4, T4, 4),
    (f5, F5, T5, 5),
    (f6, F6, T6, 6),
    (f7, F7, T7, 7)
}
