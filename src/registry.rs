use crate::slot::{HazardSlot, SlotRef};
use crate::sync::{AtomicPtr, AtomicUsize, Ordering};
use std::collections::HashSet;
use std::marker::PhantomData;
use std::ptr::{self, NonNull};

/// Process-wide list of hazard slots shared by every `Reclaimer` of a domain.
///
/// The list only ever grows by prepending at the head through a CAS loop;
/// slots are recycled through their ownership flag and never unlinked.
///
/// 一个域中所有 `Reclaimer` 共享的危险槽链表。
/// 链表只会通过 CAS 循环在头部前插来增长；
/// 槽通过其所有权标志被复用，永远不会被解链。
#[derive(Debug)]
pub(crate) struct HazardRegistry {
    head: AtomicPtr<HazardSlot>,
    /// Number of slots ever allocated. Never decreases.
    /// 已分配的槽总数。永不减少。
    count: AtomicUsize,
}

impl HazardRegistry {
    pub(crate) fn new() -> Self {
        Self {
            head: AtomicPtr::new(ptr::null_mut()),
            count: AtomicUsize::new(0),
        }
    }

    /// Acquire a free slot, allocating and linking a new one if every
    /// existing slot is owned.
    ///
    /// Walks the list once, then at most one allocation plus a CAS retry loop
    /// on the head.
    ///
    /// 获取一个空闲槽；如果所有现有槽都已被持有，则分配并链接一个新槽。
    pub(crate) fn acquire_slot(&self) -> SlotRef {
        for slot in self.slots() {
            if slot.try_acquire() {
                // SAFETY: `slot` was reached through the live list.
                return unsafe { SlotRef::from_raw(NonNull::from(slot)) };
            }
        }

        let new_slot = Box::into_raw(Box::new(HazardSlot::new_owned()));
        let mut head = self.head.load(Ordering::Acquire);
        loop {
            // SAFETY: `new_slot` is not yet published, we are its only user.
            unsafe { (*new_slot).next.store(head, Ordering::Relaxed) };
            match self
                .head
                .compare_exchange_weak(head, new_slot, Ordering::Release, Ordering::Acquire)
            {
                Ok(_) => break,
                Err(actual) => head = actual,
            }
        }
        let total = self.count.fetch_add(1, Ordering::Release) + 1;
        tracing::debug!(slot_count = total, "allocated new hazard slot");

        // SAFETY: `new_slot` came from `Box::into_raw` and is now linked.
        unsafe { SlotRef::from_raw(NonNull::new_unchecked(new_slot)) }
    }

    /// Hand a slot back to the registry. The slot stays linked.
    /// 将槽归还给注册表。槽保持链接。
    #[inline]
    pub(crate) fn release_slot(&self, slot: SlotRef) {
        slot.get().release();
    }

    /// Collect every non-null announcement in one top-to-bottom pass.
    /// 在一次自顶向下的遍历中收集所有非空公告。
    pub(crate) fn snapshot_protected_addresses(&self) -> HashSet<*mut ()> {
        self.slots()
            .map(HazardSlot::load)
            .filter(|address| !address.is_null())
            .collect()
    }

    /// True if any slot currently announces `address`.
    pub(crate) fn is_protected(&self, address: *mut ()) -> bool {
        !address.is_null() && self.slots().any(|slot| slot.load() == address)
    }

    #[inline]
    pub(crate) fn slot_count(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    fn slots(&self) -> Slots<'_> {
        Slots {
            current: self.head.load(Ordering::Acquire),
            _registry: PhantomData,
        }
    }
}

impl Drop for HazardRegistry {
    fn drop(&mut self) {
        // No `Reclaimer` can reach the list any more, so the slots can go.
        let mut current = self.head.load(Ordering::Relaxed);
        while !current.is_null() {
            // SAFETY: every slot was created by `Box::into_raw` in `acquire_slot`
            // and is freed exactly once here.
            let slot = unsafe { Box::from_raw(current) };
            current = slot.next.load(Ordering::Relaxed);
        }
    }
}

/// Iterator over the slots of a registry, head first.
struct Slots<'a> {
    current: *mut HazardSlot,
    _registry: PhantomData<&'a HazardRegistry>,
}

impl<'a> Iterator for Slots<'a> {
    type Item = &'a HazardSlot;

    fn next(&mut self) -> Option<Self::Item> {
        // SAFETY: linked slots live as long as the borrowed registry.
        let slot = unsafe { self.current.as_ref()? };
        self.current = slot.next.load(Ordering::Acquire);
        Some(slot)
    }
}
