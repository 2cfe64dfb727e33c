//! The parallel group engine: shared state, member observation, and the
//! aggregate wait.
//!
//! Each member is spawned as its own task wrapped in an abort guard, with a
//! [`MemberToken`] observing its completion through the ordinary handler
//! protocol. Settling a member writes its cells in the flat buffer, records
//! completion order, and applies the group's [`WaitPolicy`]: `One` requests
//! cancellation of the rest on any first settlement, `OneFault` only on a
//! faulted one, `All` never.
//!
//! # Critical Invariant: Every Member Settles
//!
//! The aggregate wait resolves only once all members have reached a
//! terminal state. Cancellation does not exempt a member: an aborted member
//! resolves with a cancellation fault, and a member whose driver task never
//! ran (executor rejection, executor shutdown) settles through the
//! observer's drop path with an abandonment fault. The policy decides when
//! cancellation is *requested*, never whether a slot gets written:
//!
//! ```text
//!   member settles ──> slots written, order recorded
//!        │
//!        ├─ policy triggered ──> abort handles taken, stragglers aborted
//!        │                        (they still settle, as cancelled)
//!        │
//!        └─ last member ──> aggregate wait woken, results harvested
//! ```
//!
//! The result slots are the group's only shared mutable state. Each slot is
//! written exactly once, by whichever task settles that member, and read
//! only after the wait resolves.

use core::future::Future;
use core::marker::PhantomData;
use core::pin::Pin;
use core::task::{Context, Poll, Waker};
use std::sync::Arc;

use futures::future::{AbortHandle, Abortable, Aborted};
use futures::task::Spawn;
use parking_lot::Mutex;
use smallvec::SmallVec;

use super::slot::{RawSlot, SlotLayout};
use crate::error::{Completion, Fault};
use crate::handler::Handler;
use crate::signature::Fallible;
use crate::spawn::spawn_with;
use crate::token::Token;
use crate::tracing_compat::{debug, trace};

/// When a group stops waiting early and cancels the remaining members.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WaitPolicy {
    /// Request cancellation on the first settlement of any member.
    One,
    /// Request cancellation on the first faulted settlement.
    OneFault,
    /// Never request cancellation; every member runs to completion.
    All,
}

/// Shared bookkeeping for one group, behind the group mutex.
pub(crate) struct GroupCore {
    layout: SlotLayout,
    raw: Vec<RawSlot>,
    order: SmallVec<[usize; 8]>,
    remaining: usize,
    policy: WaitPolicy,
    aborts: Vec<AbortHandle>,
    cancelled: bool,
    waker: Option<Waker>,
}

impl GroupCore {
    /// Records one settlement; returns the abort handles to fire and the
    /// waker to wake once the lock is released.
    fn note_settled(&mut self, index: usize, faulted: bool) -> (Vec<AbortHandle>, Option<Waker>) {
        self.order.push(index);
        self.remaining -= 1;
        trace!(index, faulted, remaining = self.remaining, "member settled");

        let cancel_now = match self.policy {
            WaitPolicy::One => true,
            WaitPolicy::OneFault => faulted,
            WaitPolicy::All => false,
        };

        let aborts = if cancel_now && !self.cancelled {
            self.cancelled = true;
            std::mem::take(&mut self.aborts)
        } else {
            Vec::new()
        };

        let waker = if self.remaining == 0 {
            self.waker.take()
        } else {
            None
        };

        (aborts, waker)
    }

    fn harvest(&mut self) -> GroupSettled {
        GroupSettled {
            raw: std::mem::take(&mut self.raw),
            order: std::mem::take(&mut self.order),
            layout: self.layout.clone(),
        }
    }
}

/// Creates the shared state and aggregate wait for a group of `widths.len()`
/// members.
pub(crate) fn new_group(widths: &[usize], policy: WaitPolicy) -> (Arc<Mutex<GroupCore>>, GroupWait) {
    let layout = SlotLayout::new(widths);
    let total = layout.total();
    let members = layout.members();
    let core = Arc::new(Mutex::new(GroupCore {
        layout,
        raw: (0..total).map(|_| RawSlot::Vacant).collect(),
        order: SmallVec::new(),
        remaining: members,
        policy,
        aborts: Vec::with_capacity(members),
        cancelled: false,
        waker: None,
    }));
    debug!(members, ?policy, "parallel group launched");
    let wait = GroupWait {
        core: Arc::clone(&core),
    };
    (core, wait)
}

/// Spawns one member task onto `spawner`, abort-guarded and observed.
pub(crate) fn launch_member<Sp, F, T>(
    spawner: &Sp,
    core: &Arc<Mutex<GroupCore>>,
    index: usize,
    member: F,
) where
    Sp: Spawn,
    F: Future<Output = Completion<T>> + Send + 'static,
    T: Send + 'static,
{
    let (handle, registration) = AbortHandle::new_pair();
    register_abort(core, handle);

    let guarded = async move {
        match Abortable::new(member, registration).await {
            Ok(outcome) => outcome,
            Err(Aborted) => Err(Fault::cancelled()),
        }
    };

    let token = MemberToken {
        core: Arc::clone(core),
        index,
    };
    spawn_with(spawner, guarded, token);
}

fn register_abort(core: &Mutex<GroupCore>, handle: AbortHandle) {
    let pending = {
        let mut guard = core.lock();
        if guard.cancelled {
            Some(handle)
        } else {
            guard.aborts.push(handle);
            None
        }
    };
    if let Some(handle) = pending {
        handle.abort();
    }
}

/// Requests cancellation of every member that has not yet settled.
///
/// Returns the number of members still unsettled when the request was made.
/// A fully settled group has none; any handles it still holds are spent, so
/// they are discarded without firing and nothing is logged.
pub(crate) fn request_cancel_all(core: &Mutex<GroupCore>) -> usize {
    let (aborts, pending) = {
        let mut guard = core.lock();
        guard.cancelled = true;
        (std::mem::take(&mut guard.aborts), guard.remaining)
    };
    if pending == 0 || aborts.is_empty() {
        return 0;
    }
    debug!(members = pending, "group cancellation requested");
    for handle in aborts {
        handle.abort();
    }
    pending
}

fn settle<T: Send + 'static>(core: &Mutex<GroupCore>, index: usize, outcome: Completion<T>) {
    let (aborts, waker) = {
        let mut guard = core.lock();
        let offset = guard.layout.offset(index);
        let faulted = outcome.is_err();
        match outcome {
            Ok(value) => {
                guard.raw[offset] = RawSlot::Clear;
                if guard.layout.width(index) == 2 {
                    guard.raw[offset + 1] = RawSlot::Value(Box::new(value));
                }
            }
            Err(fault) => guard.raw[offset] = RawSlot::Faulted(fault),
        }
        guard.note_settled(index, faulted)
    };
    for handle in aborts {
        handle.abort();
    }
    if let Some(waker) = waker {
        waker.wake();
    }
}

fn abandon(core: &Mutex<GroupCore>, index: usize) {
    let (aborts, waker) = {
        let mut guard = core.lock();
        let offset = guard.layout.offset(index);
        guard.raw[offset] = RawSlot::Faulted(Fault::abandoned());
        guard.note_settled(index, true)
    };
    for handle in aborts {
        handle.abort();
    }
    if let Some(waker) = waker {
        waker.wake();
    }
}

/// The internal token observing one member's completion.
pub(crate) struct MemberToken {
    core: Arc<Mutex<GroupCore>>,
    index: usize,
}

impl<T: Send + 'static> Token<Fallible<T>> for MemberToken {
    type Output = ();
    type Handler = MemberObserver<T>;

    fn initiate<I: FnOnce(Self::Handler)>(self, start: I) {
        start(MemberObserver {
            core: Some(self.core),
            index: self.index,
            _values: PhantomData,
        });
    }
}

/// The handler materialized by [`MemberToken`].
///
/// Invocation settles the member's slots. If the observer is instead
/// dropped un-invoked (its driver task was rejected or destroyed before
/// completing), the drop path settles the member with an abandonment fault,
/// so the group cannot hang on a vanished member.
pub(crate) struct MemberObserver<T> {
    core: Option<Arc<Mutex<GroupCore>>>,
    index: usize,
    _values: PhantomData<fn() -> T>,
}

impl<T: Send + 'static> Handler<Fallible<T>> for MemberObserver<T> {
    fn complete(mut self, values: Completion<T>) {
        if let Some(core) = self.core.take() {
            settle(&core, self.index, values);
        }
    }
}

impl<T> Drop for MemberObserver<T> {
    fn drop(&mut self) {
        if let Some(core) = self.core.take() {
            abandon(&core, self.index);
        }
    }
}

/// The aggregate wait: resolves once every member has settled.
///
/// Dropping an unresolved wait requests cancellation of all members, which
/// is how external cancellation of a combinator propagates inward.
pub(crate) struct GroupWait {
    core: Arc<Mutex<GroupCore>>,
}

impl Future for GroupWait {
    type Output = GroupSettled;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<GroupSettled> {
        let mut guard = self.core.lock();
        if guard.remaining == 0 {
            Poll::Ready(guard.harvest())
        } else {
            guard.waker = Some(cx.waker().clone());
            Poll::Pending
        }
    }
}

impl Drop for GroupWait {
    fn drop(&mut self) {
        request_cancel_all(&self.core);
    }
}

/// The harvested outcomes of a resolved group.
pub(crate) struct GroupSettled {
    raw: Vec<RawSlot>,
    order: SmallVec<[usize; 8]>,
    layout: SlotLayout,
}

impl GroupSettled {
    /// Index of the member the wait observed settling first.
    pub(crate) fn first_settled(&self) -> usize {
        self.order[0]
    }

    /// Removes and returns the first fault in completion order, if any.
    pub(crate) fn first_fault(&mut self) -> Option<Fault> {
        for position in 0..self.order.len() {
            let index = self.order[position];
            let offset = self.layout.offset(index);
            match std::mem::replace(&mut self.raw[offset], RawSlot::Vacant) {
                RawSlot::Faulted(fault) => return Some(fault),
                other => self.raw[offset] = other,
            }
        }
        None
    }

    /// Removes and returns member `index`'s outcome.
    ///
    /// `T` must be the member's declared value type; the layout width
    /// decides whether a stored value is read or the unit value synthesized.
    pub(crate) fn take<T: 'static>(&mut self, index: usize) -> Completion<T> {
        let offset = self.layout.offset(index);
        match std::mem::replace(&mut self.raw[offset], RawSlot::Vacant) {
            RawSlot::Faulted(fault) => Err(fault),
            RawSlot::Clear => {
                let boxed: Box<dyn core::any::Any + Send> = if self.layout.width(index) == 2 {
                    match std::mem::replace(&mut self.raw[offset + 1], RawSlot::Vacant) {
                        RawSlot::Value(value) => value,
                        _ => unreachable!("value cell missing for a settled member"),
                    }
                } else {
                    Box::new(())
                };
                match boxed.downcast::<T>() {
                    Ok(value) => Ok(*value),
                    Err(_) => unreachable!("group slot held a value of an unexpected type"),
                }
            }
            RawSlot::Vacant | RawSlot::Value(_) => {
                unreachable!("member outcome taken twice or never settled")
            }
        }
    }
}
