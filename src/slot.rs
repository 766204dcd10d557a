use crate::sync::{AtomicBool, AtomicPtr, Ordering};
use std::ptr::{self, NonNull};

/// A single hazard announcement cell in the shared registry.
///
/// Once linked into the registry a slot is never unlinked or freed until the
/// registry itself is dropped, so a scanner can always walk the list without
/// protecting the slots themselves.
///
/// Cache-aligned to prevent false sharing between announcing threads.
///
/// 共享注册表中的单个危险指针公告槽。
/// 一旦链接进注册表，槽在注册表本身被 drop 之前永远不会被解链或释放，
/// 因此扫描者无需保护槽本身即可遍历链表。
/// 缓存对齐以防止公告线程之间的伪共享。
#[derive(Debug)]
#[repr(align(64))]
pub(crate) struct HazardSlot {
    /// True while some live `Reclaimer` holds this slot.
    /// 当某个存活的 `Reclaimer` 持有此槽时为 true。
    owned: AtomicBool,
    /// The announced address, or null.
    /// 已公告的地址，或 null。
    protected: AtomicPtr<()>,
    /// Next slot in the registry list. Written once before publication.
    /// 注册表链表中的下一个槽。在发布之前只写一次。
    pub(crate) next: AtomicPtr<HazardSlot>,
}

impl HazardSlot {
    /// A fresh slot that is already owned by the thread allocating it.
    pub(crate) fn new_owned() -> Self {
        Self {
            owned: AtomicBool::new(true),
            protected: AtomicPtr::new(ptr::null_mut()),
            next: AtomicPtr::new(ptr::null_mut()),
        }
    }

    /// Test-and-set on the ownership flag. Returns true if the caller won the slot.
    #[inline]
    pub(crate) fn try_acquire(&self) -> bool {
        !self.owned.load(Ordering::Relaxed) && !self.owned.swap(true, Ordering::Acquire)
    }

    #[inline]
    pub(crate) fn release(&self) {
        self.owned.store(false, Ordering::Release);
    }

    #[inline]
    pub(crate) fn publish(&self, address: *mut ()) {
        self.protected.store(address, Ordering::Release);
    }

    #[inline]
    pub(crate) fn load(&self) -> *mut () {
        self.protected.load(Ordering::Acquire)
    }
}

/// Stable handle to a slot owned by the registry.
///
/// Valid for as long as the registry that produced it is alive; every holder
/// keeps an `Arc` to that registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SlotRef(NonNull<HazardSlot>);

impl SlotRef {
    /// # Safety
    /// `slot` must point to a slot linked into a live registry.
    #[inline]
    pub(crate) unsafe fn from_raw(slot: NonNull<HazardSlot>) -> Self {
        SlotRef(slot)
    }

    #[inline]
    pub(crate) fn get(&self) -> &HazardSlot {
        // SAFETY: slots are immortal while the registry lives, and every
        // `SlotRef` holder keeps the registry alive.
        unsafe { self.0.as_ref() }
    }
}
