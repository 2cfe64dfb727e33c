//! Join combinators that re-raise the first fault.
//!
//! `allN` spawns N independently-typed suspended computations onto one
//! executor and waits for all of them. When every member produces a value
//! the results arrive as a tuple in declaration order, regardless of the
//! order in which members actually finished. The first fault the group
//! records cancels the members still running and is re-raised to the
//! caller once everything has settled; later faults are discarded.

use core::future::Future;

use futures::task::Spawn;

use super::slot::slot_width;
use super::wait::{launch_member, new_group, WaitPolicy};
use crate::error::Completion;

macro_rules! define_all {
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
        ) -> impl Future<Output = Completion<($($t),+)>> + Send
        where
            Sp: Spawn,
            $(
                $fut: Future<Output = Completion<$t>> + Send + 'static,
                $t: Send + 'static,
            )+
        {
            let widths = [$(slot_width::<$t>()),+];
            let (core, wait) = new_group(&widths, WaitPolicy::OneFault);
            $(launch_member(spawner, &core, $idx, $f);)+
            async move {
                let mut settled = wait.await;
                if let Some(fault) = settled.first_fault() {
                    return Err(fault);
                }
                Ok(($(settled.take::<$t>($idx)?),+))
            }
        }
    };
}

define_all! {
    /// Joins two members; resolves with their values in declaration order.
    ///
    /// Members are spawned in declaration order on `spawner`. A fault from
    /// any member cancels the rest, and the earliest recorded fault is
    /// re-raised after every member has settled.
    all2;
    (f0, F0, T0, 0),
    (f1, F1, T1, 1)
}

define_all! {
    /// Like [`all2`] with three members.
    all3;
    (f0, F0, T0, 0),
    (f1, F1, T1, 1),
    (f2, F2, T2, 2)
}

define_all! {
    /// Like [`all2`] with four members.
    all4;
    (f0, F0, T0, 0),
    (f1, F1, T1, 1),
    (f2, F2, T2, 2),
    (f3, F3, T3, 3)
}

define_all! {
    /// Like [`all2`] with five members.
    all5;
    (f0, F0, T0, 0),
    (f1, F1, T1, 1),
    (f2, F2, T2, 2),
    (f3, F3, T3, 3),
    (f4, F4, T4, 4)
}

define_all! {
    /// Like [`all2`] with six members.
    all6;
    (f0, F0, T0, 0),
    (f1, F1, T1, 1),
    (f2, F2, T2, 2),
    (f3, F3, T3, 3),
    (f4, F4, T4, 4),
    (f5, F5, T5, 5)
}

define_all! {
    /// Like [`all2`] with seven members.
    all7;
    (f0, F0, T0, 0),
    (f1, F1, T1, 1),
    (f2, F2, T2, 2),
    (f3, F3, T3, 3),
    (f4, F4, T4, 4),
    (f5, F5, T5, 5),
    (f6, F6, T6, 6)
}

define_all! {
    /// Like [`all2`] with eight members.
    all8;
    (f0, F0, T0, 0),
    (f1, F1, T1, 1),
    (f2, F2, T2, 2),
    (f3, F3, T3, 3),
    (f4, F4, T4, 4),
    (f5, F5, T5, 5),
    (f6, F6, T6, 6),
    (f7, F7, T7, 7)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, Fault};
    use crate::test_utils::yield_now;
    use futures::executor::LocalPool;
    use futures::future::pending;

    #[test]
    fn all2_returns_values_in_declaration_order() {
        let mut pool = LocalPool::new();
        let spawner = pool.spawner();

        // Member 1 finishes before member 0; the tuple stays declared order.
        let result = pool.run_until(all2(
            &spawner,
            async {
                yield_now().await;
                Ok(1_u32)
            },
            async { Ok("two") },
        ));

        assert_eq!(result.unwrap(), (1, "two"));
    }

    #[test]
    fn all2_fault_cancels_the_straggler() {
        let mut pool = LocalPool::new();
        let spawner = pool.spawner();

        // The run terminating at all shows the pending member was cancelled
        // and settled rather than waited on forever.
        let result = pool.run_until(all2(
            &spawner,
            async { Err::<u32, _>(Fault::from("boom")) },
            pending::<Completion<String>>(),
        ));

        assert_eq!(result.unwrap_err().code(), Some(ErrorKind::User));
    }

    #[test]
    fn all2_reraises_the_earliest_recorded_fault() {
        let mut pool = LocalPool::new();
        let spawner = pool.spawner();

        let result = pool.run_until(all2(
            &spawner,
            async {
                yield_now().await;
                Err::<u32, _>(Fault::from("slow fault"))
            },
            async { Err::<(), _>(Fault::from("fast fault")) },
        ));

        let fault = result.unwrap_err();
        assert!(fault.message().contains("fast fault"), "got {fault}");
    }

    #[test]
    fn all3_carries_unit_members() {
        let mut pool = LocalPool::new();
        let spawner = pool.spawner();

        let result = pool.run_until(all3(
            &spawner,
            async { Ok(()) },
            async { Ok(2_u32) },
            async { Ok("three") },
        ));

        assert_eq!(result.unwrap(), ((), 2, "three"));
    }
}
