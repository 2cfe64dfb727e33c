//! Flat result storage for parallel groups.
//!
//! A group keeps every member's outcome in one flat buffer of [`RawSlot`]
//! cells. A member's span in that buffer depends on its declared value
//! type: unit members occupy one cell (the outcome alone), value-bearing
//! members occupy two (outcome, then the boxed value). [`SlotLayout`] holds
//! the per-member widths and their prefix-sum offsets; it is computed once
//! when the group is constructed and is the single source of truth for
//! locating a member's cells.

use core::any::{Any, TypeId};

use smallvec::SmallVec;

use crate::error::Fault;

/// One cell of the flat result buffer.
pub(crate) enum RawSlot {
    /// Not yet written.
    Vacant,
    /// Outcome cell of a member that settled without fault.
    Clear,
    /// Outcome cell of a member that settled with this fault.
    Faulted(Fault),
    /// Value cell of a value-bearing member.
    Value(Box<dyn Any + Send>),
}

/// Number of raw cells a member of value type `T` occupies.
pub(crate) fn slot_width<T: 'static>() -> usize {
    if TypeId::of::<T>() == TypeId::of::<()>() {
        1
    } else {
        2
    }
}

/// Per-member widths and prefix-sum offsets into the flat buffer.
#[derive(Debug, Clone, Default)]
pub(crate) struct SlotLayout {
    widths: SmallVec<[usize; 8]>,
    offsets: SmallVec<[usize; 8]>,
    total: usize,
}

impl SlotLayout {
    /// Builds the offset table from left-to-right member widths.
    pub(crate) fn new(widths: &[usize]) -> Self {
        let mut offsets = SmallVec::with_capacity(widths.len());
        let mut total = 0;
        for &width in widths {
            offsets.push(total);
            total += width;
        }
        Self {
            widths: SmallVec::from_slice(widths),
            offsets,
            total,
        }
    }

    /// First cell of member `index`.
    pub(crate) fn offset(&self, index: usize) -> usize {
        self.offsets[index]
    }

    /// Cell count of member `index`.
    pub(crate) fn width(&self, index: usize) -> usize {
        self.widths[index]
    }

    /// Total cell count across all members.
    pub(crate) fn total(&self) -> usize {
        self.total
    }

    /// Member count.
    pub(crate) fn members(&self) -> usize {
        self.widths.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widths_distinguish_unit_members() {
        assert_eq!(slot_width::<()>(), 1);
        assert_eq!(slot_width::<u32>(), 2);
        assert_eq!(slot_width::<String>(), 2);
    }

    #[test]
    fn offsets_are_prefix_sums() {
        let layout = SlotLayout::new(&[2, 1, 2, 1]);
        assert_eq!(layout.members(), 4);
        assert_eq!(layout.total(), 6);
        assert_eq!(layout.offset(0), 0);
        assert_eq!(layout.offset(1), 2);
        assert_eq!(layout.offset(2), 3);
        assert_eq!(layout.offset(3), 5);
        assert_eq!(layout.width(1), 1);
        assert_eq!(layout.width(2), 2);
    }
}
