use crate::config::Config;
use crate::registry::HazardRegistry;
use crate::retired::{RetirePool, RetireRecord, drop_value};
use crate::slot::SlotRef;
use crate::sync::{Arc, AtomicPtr, Ordering, fence};
use std::collections::HashMap;
use std::ptr;

/// A thread's hazard-pointer reclamation engine.
///
/// Each thread working on a protected structure should create exactly one
/// `Reclaimer` via `HazardDomain::register()` and keep it for its lifetime.
/// It is `!Send` and `!Sync`.
///
/// The `Reclaimer` is used to:
/// - Announce the addresses the thread is about to dereference (`mark_hazard`, `protect`).
/// - Retire unlinked nodes instead of freeing them (`retire`, `retire_box`).
/// - Sweep its own retirements once enough of them are pending (`try_reclaim`).
///
/// **Local indices**: announcements go through small per-thread indices.
/// Index `i` is backed by a registry slot acquired the first time `i` is used;
/// indices must be introduced in increasing order starting at `0`.
///
/// **Teardown**: dropping the `Reclaimer` releases its slots and then frees
/// every pending retirement, waiting for other threads to clear their hazards
/// on each one first. All of this thread's announcements must already be cleared.
///
/// 线程的危险指针回收引擎。
/// 每个操作受保护结构的线程应该通过 `HazardDomain::register()` 创建恰好一个
/// `Reclaimer` 并在其生命周期内持有它。它是 `!Send` 和 `!Sync` 的。
/// `Reclaimer` 用于：
/// - 公告线程即将解引用的地址（`mark_hazard`、`protect`）。
/// - 退休被解链的节点而不是立即释放（`retire`、`retire_box`）。
/// - 当待回收数量足够多时扫描并回收（`try_reclaim`）。
/// **本地索引**：公告通过每线程的小整数索引进行。索引必须从 `0` 开始按递增顺序引入。
/// **销毁**：drop `Reclaimer` 会释放其槽，然后释放所有待回收对象，
/// 在释放每个对象之前等待其他线程清除对它的危险指针。
pub struct Reclaimer {
    registry: Arc<HazardRegistry>,
    config: Config,
    /// Local index -> acquired registry slot. Grows, never shrinks.
    slots: Vec<SlotRef>,
    /// Retired address -> pending record.
    retired: HashMap<*mut (), Box<RetireRecord>>,
    pool: RetirePool,
    scans: usize,
}

impl Reclaimer {
    pub(crate) fn new(registry: Arc<HazardRegistry>, config: Config) -> Self {
        let pool = RetirePool::new(config.pool_capacity);
        Self {
            registry,
            config,
            slots: Vec::new(),
            retired: HashMap::new(),
            pool,
            scans: 0,
        }
    }

    /// Make sure local index `index` is backed by a registry slot.
    fn slot(&mut self, index: usize) -> &SlotRef {
        assert!(
            index <= self.slots.len(),
            "BUG: hazard index {index} skips past the {} slot(s) owned by this thread. \
             Indices must be used in increasing order starting at 0.",
            self.slots.len()
        );

        if index == self.slots.len() {
            let slot = self.registry.acquire_slot();
            self.slots.push(slot);
        }
        &self.slots[index]
    }

    /// Announce that this thread may dereference `address` through local slot `index`.
    ///
    /// Passing a null `address` clears the announcement.
    ///
    /// # Panics
    /// If `index` is more than one past the highest index used so far.
    ///
    /// 公告此线程可能通过本地槽 `index` 解引用 `address`。传递空地址会清除公告。
    #[inline]
    pub fn mark_hazard(&mut self, index: usize, address: *mut ()) {
        self.slot(index).get().publish(address);
    }

    /// Current announcement for local slot `index`, or null.
    ///
    /// Acquires the slot on first use, like `mark_hazard`.
    ///
    /// 本地槽 `index` 当前的公告，或 null。首次使用时获取槽。
    #[inline]
    pub fn get_hazard(&mut self, index: usize) -> *mut () {
        self.slot(index).get().load()
    }

    /// Clear the announcement in local slot `index`.
    /// 清除本地槽 `index` 中的公告。
    #[inline]
    pub fn clear_hazard(&mut self, index: usize) {
        self.mark_hazard(index, ptr::null_mut());
    }

    /// Clear every announcement this thread holds.
    pub fn clear_all(&mut self) {
        for slot in &self.slots {
            slot.get().publish(ptr::null_mut());
        }
    }

    /// Load `src` and announce the loaded pointer in slot `index`.
    ///
    /// Repeats until the announced pointer is still the value of `src` after
    /// the announcement became visible, so the returned pointer cannot have
    /// been reclaimed by a sweep that started after this call returned.
    /// A null result is announced as null.
    ///
    /// 加载 `src` 并在槽 `index` 中公告加载的指针。
    /// 重复直到公告可见之后 `src` 的值仍是该指针。
    pub fn protect<T>(&mut self, index: usize, src: &AtomicPtr<T>) -> *mut T {
        let slot = *self.slot(index);
        let mut current = src.load(Ordering::Acquire);
        loop {
            slot.get().publish(current.cast());
            fence(Ordering::SeqCst);
            let reloaded = src.load(Ordering::Acquire);
            if reloaded == current {
                return current;
            }
            current = reloaded;
        }
    }

    /// Schedule `destructor(address)` to run once no thread announces `address`.
    ///
    /// The record is thread-local; no other thread is involved until a sweep.
    /// If automatic reclamation is enabled, a `try_reclaim` follows.
    ///
    /// # Panics
    /// If `address` is null, or is already pending in this thread.
    ///
    /// 安排在没有线程公告 `address` 时运行 `destructor(address)`。
    /// 如果启用了自动回收，随后会调用 `try_reclaim`。
    pub fn retire<F>(&mut self, address: *mut (), destructor: F)
    where
        F: FnOnce(*mut ()) + 'static,
    {
        assert!(!address.is_null(), "BUG: retiring a null address");

        let mut record = self.pool.pop();
        record.fill(address, Box::new(destructor));
        let previous = self.retired.insert(address, record);
        assert!(
            previous.is_none(),
            "BUG: address {address:p} retired twice before it was reclaimed"
        );

        if self.config.auto_reclaim {
            self.try_reclaim();
        }
    }

    /// Retire a pointer obtained from `Box::into_raw`; it is dropped as a `Box<T>`.
    ///
    /// # Safety
    /// `ptr` must come from `Box::<T>::into_raw`, must already be unreachable
    /// for threads that have not announced it, and must not be retired again.
    ///
    /// 退休一个由 `Box::into_raw` 得到的指针；它将作为 `Box<T>` 被 drop。
    pub unsafe fn retire_box<T: 'static>(&mut self, ptr: *mut T) {
        self.retire(ptr.cast(), |address| unsafe { drop_value::<T>(address) });
    }

    /// Sweep if the pending count has reached the threshold.
    ///
    /// The threshold is `ceil(coefficient * slot_count)`, so the cost of one
    /// registry scan is spread across that many retirements. Below the
    /// threshold this does nothing. Returns the number of destructors run.
    ///
    /// 如果待回收数量达到阈值则进行扫描。
    /// 阈值为 `ceil(coefficient * slot_count)`。低于阈值时不做任何事。
    /// 返回运行的析构函数数量。
    pub fn try_reclaim(&mut self) -> usize {
        if self.retired.is_empty() || self.retired.len() < self.reclaim_threshold() {
            return 0;
        }
        self.scan()
    }

    /// Sweep regardless of the threshold. Returns the number of destructors run.
    /// 无视阈值进行扫描。返回运行的析构函数数量。
    pub fn reclaim_now(&mut self) -> usize {
        if self.retired.is_empty() {
            return 0;
        }
        self.scan()
    }

    fn scan(&mut self) -> usize {
        // Pairs with the fence in `protect`: any announcement made before the
        // corresponding unlink is visible to the snapshot below.
        fence(Ordering::SeqCst);
        let hazards = self.registry.snapshot_protected_addresses();
        let before = self.retired.len();

        let unprotected: Vec<*mut ()> = self
            .retired
            .keys()
            .filter(|address| !hazards.contains(*address))
            .copied()
            .collect();
        for address in &unprotected {
            if let Some(mut record) = self.retired.remove(address) {
                record.reclaim();
                self.pool.push(record);
            }
        }
        let reclaimed = unprotected.len();

        self.scans += 1;
        tracing::trace!(
            pending_before = before,
            reclaimed,
            hazards = hazards.len(),
            "hazard sweep"
        );
        reclaimed
    }

    /// Block until no slot in the domain announces `address`.
    ///
    /// Polls the registry and calls the domain's yield hook between polls.
    /// There is no timeout: a hazard that is never cleared blocks forever.
    ///
    /// 阻塞直到域中没有槽公告 `address`。
    /// 轮询注册表，并在两次轮询之间调用域的让出钩子。没有超时。
    pub fn wait_until_unprotected(&self, address: *mut ()) {
        while self.registry.is_protected(address) {
            (self.config.yield_hook)();
        }
    }

    /// Number of local indices backed by a slot.
    #[inline]
    pub fn owned_slots(&self) -> usize {
        self.slots.len()
    }

    /// Number of retirements not yet reclaimed.
    #[inline]
    pub fn pending(&self) -> usize {
        self.retired.len()
    }

    /// Number of sweeps actually performed.
    #[inline]
    pub fn scan_count(&self) -> usize {
        self.scans
    }

    /// Number of recycled records waiting in the pool.
    #[inline]
    pub fn pooled(&self) -> usize {
        self.pool.len()
    }

    /// The threshold `try_reclaim` compares against right now.
    #[inline]
    pub fn reclaim_threshold(&self) -> usize {
        self.config.threshold(self.registry.slot_count())
    }
}

impl Drop for Reclaimer {
    fn drop(&mut self) {
        // Step 1: hand the slots back.
        for (index, slot) in self.slots.drain(..).enumerate() {
            let announced = slot.get().load();
            assert!(
                announced.is_null(),
                "BUG: thread exiting while hazard index {index} still announces {announced:p}. \
                 Clear every hazard before dropping the Reclaimer."
            );
            self.registry.release_slot(slot);
        }

        // Step 2: free everything still pending, waiting out foreign hazards.
        let pending = self.retired.len();
        if pending > 0 {
            tracing::debug!(pending, "draining retirements on thread exit");
        }
        fence(Ordering::SeqCst);
        for (address, mut record) in std::mem::take(&mut self.retired) {
            self.wait_until_unprotected(address);
            record.reclaim();
        }
    }
}

impl std::fmt::Debug for Reclaimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reclaimer")
            .field("owned_slots", &self.slots.len())
            .field("pending", &self.retired.len())
            .field("pooled", &self.pool.len())
            .field("scans", &self.scans)
            .finish()
    }
}
