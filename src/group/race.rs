//! First-settlement combinators over heterogeneous members.
//!
//! `raceN` spawns N independently-typed suspended computations onto one
//! executor and resolves with the first settlement, value or fault, tagged
//! with the winning position as a [`Winner2`]..[`Winner8`] union. The
//! remaining members are cancelled; their eventual outcomes are never
//! observed by the caller, though each still settles internally before the
//! race resolves.
//!
//! The winner is whichever settlement the group records first under its
//! lock. Simultaneous completions therefore tie-break deterministically on
//! that recorded order, and exactly one position is ever reported. A
//! faulted winner re-raises its fault to the caller.

use core::future::Future;

use futures::task::Spawn;

use super::slot::slot_width;
use super::wait::{launch_member, new_group, WaitPolicy};
use crate::error::Completion;

macro_rules! define_winner {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident($t:ident) => $idx:tt),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name<$($t),+> {
            $(
                #[doc = concat!("Member ", stringify!($idx), " settled first.")]
                $variant($t),
            )+
        }

        impl<$($t),+> $name<$($t),+> {
            /// Positional index of the winning member.
            #[must_use]
            pub const fn index(&self) -> usize {
                match self {
                    $(Self::$variant(_) => $idx,)+
                }
            }
        }
    };
}

define_winner! {
    /// The winning member of a two-way race.
    Winner2 { First(A) => 0, Second(B) => 1 }
}

define_winner! {
    /// The winning member of a three-way race.
    Winner3 { First(A) => 0, Second(B) => 1, Third(C) => 2 }
}

define_winner! {
    /// The winning member of a four-way race.
    Winner4 { First(A) => 0, Second(B) => 1, Third(C) => 2, Fourth(D) => 3 }
}

define_winner! {
    /// The winning member of a five-way race.
    Winner5 { First(A) => 0, Second(B) => 1, Third(C) => 2, Fourth(D) => 3, Fifth(E) => 4 }
}

define_winner! {
    /// The winning member of a six-way race.
    Winner6 {
        First(A) => 0, Second(B) => 1, Third(C) => 2, Fourth(D) => 3, Fifth(E) => 4,
        Sixth(F) => 5,
    }
}

define_winner! {
    /// The winning member of a seven-way race.
    Winner7 {
        First(A) => 0, Second(B) => 1, Third(C) => 2, Fourth(D) => 3, Fifth(E) => 4,
        Sixth(F) => 5, Seventh(G) => 6,
    }
}

define_winner! {
    /// The winning member of an eight-way race.
    Winner8 {
        First(A) => 0, Second(B) => 1, Third(C) => 2, Fourth(D) => 3, Fifth(E) => 4,
        Sixth(F) => 5, Seventh(G) => 6, Eighth(H) => 7,
    }
}

macro_rules! define_race {
    (
        $(#[$meta:meta])*
        $name:ident, $winner:ident;
        $(($f:ident, $fut:ident, $t:ident, $variant:ident, $idx:tt)),+
    ) => {
        $(#[$meta])*
        #[must_use]
        pub fn $name<Sp, $($fut, $t),+>(
            spawner: &Sp,
            $($f: $fut),+
        ) -> impl Future<Output = Completion<$winner<$($t),+>>> + Send
        where
            Sp: Spawn,
            $(
                $fut: Future<Output = Completion<$t>> + Send + 'static,
                $t: Send + 'static,
            )+
        {
            let widths = [$(slot_width::<$t>()),+];
            let (core, wait) = new_group(&widths, WaitPolicy::One);
            $(launch_member(spawner, &core, $idx, $f);)+
            async move {
                let mut settled = wait.await;
                match settled.first_settled() {
                    $($idx => settled.take::<$t>($idx).map($winner::$variant),)+
                    other => unreachable!("winner index {other} out of bounds"),
                }
            }
        }
    };
}

define_race! {
    /// Races two members; resolves with the first settlement.
    ///
    /// Members are spawned in declaration order on `spawner`. The first
    /// settlement, value or fault, decides the outcome: a value arrives as
    /// the correspondingly tagged [`Winner2`], a fault is re-raised. The
    /// loser is cancelled and its outcome discarded.
    race2, Winner2;
    (f0, F0, T0, First, 0),
    (f1, F1, T1, Second, 1)
}

define_race! {
    /// Like [`race2`] with three members.
    race3, Winner3;
    (f0, F0, T0, First, 0),
    (f1, F1, T1, Second, 1),
    (f2, F2, T2, Third, 2)
}

define_race! {
    /// Like [`race2`] with four members.
    race4, Winner4;
    (f0, F0, T0, First, 0),
    (f1, F1, T1, Second, 1),
    (f2, F2, T2, Third, 2),
    (f3, F3, T3, Fourth, 3)
}

define_race! {
    /// Like [`race2`] with five members.
    race5, Winner5;
    (f0, F0, T0, First, 0),
    (f1, F1, T1, Second, 1),
    (f2, F2, T2, Third, 2),
    (f3, F3, T3, Fourth, 3),
    (f4, F4, T4, Fifth, 4)
}

define_race! {
    /// Like [`race2`] with six members.
    race6, Winner6;
    (f0, F0, T0, First, 0),
    (f1, F1, T1, Second, 1),
    (f2, F2, T2, Third, 2),
    (f3, F3, T3, Fourth, 3),
    (f4, F4, T4, Fifth, 4),
    (f5, F5, T5, Sixth, 5)
}

define_race! {
    /// Like [`race2`] with seven members.
    race7, Winner7;
    (f0, F0, T0, First, 0),
    (f1, F1, T1, Second, 1),
    (f2, F2, T2, Third, 2),
    (f3, F3, T3, Fourth, 3),
    (f4, F4, T4, Fifth, 4),
    (f5, F5, T5, Sixth, 5),
    (f6, F6, T6, Seventh, 6)
}

define_race! {
    /// Like [`race2`] with eight members.
    race8, Winner8;
    (f0, F0, T0, First, 0),
    (f1, F1, T1, Second, 1),
    (f2, F2, T2, Third, 2),
    (f3, F3, T3, Fourth, 3),
    (f4, F4, T4, Fifth, 4),
    (f5, F5, T5, Sixth, 5),
    (f6, F6, T6, Seventh, 6),
    (f7, F7, T7, Eighth, 7)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, Fault};
    use futures::executor::LocalPool;
    use futures::future::pending;

    #[test]
    fn race2_resolves_with_the_first_settlement() {
        let mut pool = LocalPool::new();
        let spawner = pool.spawner();

        let winner = pool.run_until(race2(
            &spawner,
            async { Ok(5_u32) },
            pending::<Completion<String>>(),
        ));

        assert_eq!(winner.unwrap(), Winner2::First(5));
    }

    #[test]
    fn race2_second_member_can_win() {
        let mut pool = LocalPool::new();
        let spawner = pool.spawner();

        let winner = pool.run_until(race2(
            &spawner,
            pending::<Completion<u32>>(),
            async { Ok("fast") },
        ));

        assert_eq!(winner.unwrap(), Winner2::Second("fast"));
    }

    #[test]
    fn race2_faulted_winner_reraises() {
        let mut pool = LocalPool::new();
        let spawner = pool.spawner();

        let winner = pool.run_until(race2(
            &spawner,
            async { Err::<u32, _>(Fault::from("fast failure")) },
            pending::<Completion<String>>(),
        ));

        let fault = winner.unwrap_err();
        assert_eq!(fault.code(), Some(ErrorKind::User));
    }

    #[test]
    fn race3_middle_member_can_win() {
        let mut pool = LocalPool::new();
        let spawner = pool.spawner();

        let winner = pool.run_until(race3(
            &spawner,
            pending::<Completion<u32>>(),
            async { Ok("middle") },
            pending::<Completion<()>>(),
        ));

        assert_eq!(winner.unwrap(), Winner3::Second("middle"));
    }

    #[test]
    fn winner_reports_its_position() {
        assert_eq!(Winner2::<(), u8>::First(()).index(), 0);
        assert_eq!(Winner3::<u8, u8, u8>::Third(9).index(), 2);
        assert_eq!(Winner8::<u8, u8, u8, u8, u8, u8, u8, u8>::Eighth(1).index(), 7);
    }
}
