use std::fmt;
use std::ptr;

/// Type-erased destructor for a retired address.
/// 已退休地址的类型擦除析构函数。
pub(crate) type Destructor = Box<dyn FnOnce(*mut ())>;

/// Generic destructor for addresses produced by `Box::into_raw`.
/// Converts the raw pointer back to `Box<T>` and drops it.
///
/// 由 `Box::into_raw` 产生的地址的通用析构函数。
/// 将原始指针转换回 `Box<T>` 并将其 drop。
#[inline(always)]
pub(crate) unsafe fn drop_value<T>(address: *mut ()) {
    unsafe {
        drop(Box::from_raw(address as *mut T));
    }
}

/// An object that has been logically removed but not yet freed.
///
/// The destructor is moved in on `fill` and moved out when it runs, so a
/// record that is recycled or dropped never holds a live destructor for a
/// reclaimed address.
///
/// 一个已被逻辑删除但尚未释放的对象。
/// 析构函数在 `fill` 时移入，运行时移出。
pub(crate) struct RetireRecord {
    address: *mut (),
    destructor: Option<Destructor>,
}

impl RetireRecord {
    fn empty() -> Self {
        Self {
            address: ptr::null_mut(),
            destructor: None,
        }
    }

    #[inline]
    pub(crate) fn fill(&mut self, address: *mut (), destructor: Destructor) {
        debug_assert!(self.destructor.is_none(), "BUG: filling a record that is still pending");
        self.address = address;
        self.destructor = Some(destructor);
    }

    #[inline]
    pub(crate) fn address(&self) -> *mut () {
        self.address
    }

    /// Run the destructor. A record runs it at most once.
    /// 运行析构函数。每条记录最多运行一次。
    #[inline]
    pub(crate) fn reclaim(&mut self) {
        if let Some(destructor) = self.destructor.take() {
            destructor(self.address);
        }
        self.address = ptr::null_mut();
    }
}

impl fmt::Debug for RetireRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetireRecord")
            .field("address", &self.address)
            .field("pending", &self.destructor.is_some())
            .finish()
    }
}

/// Thread-confined free list of retirement records.
///
/// Exists only to avoid an allocation per `retire`; it has no bearing on
/// correctness.
///
/// 线程私有的退休记录空闲链表。仅用于避免每次 `retire` 都分配内存。
#[derive(Debug, Default)]
pub(crate) struct RetirePool {
    free: Vec<Box<RetireRecord>>,
    capacity: Option<usize>,
}

impl RetirePool {
    pub(crate) fn new(capacity: Option<usize>) -> Self {
        Self {
            free: Vec::new(),
            capacity,
        }
    }

    /// Take a recycled record, or allocate one if the pool is empty.
    #[inline]
    pub(crate) fn pop(&mut self) -> Box<RetireRecord> {
        self.free
            .pop()
            .unwrap_or_else(|| Box::new(RetireRecord::empty()))
    }

    /// Give a reclaimed record back. Surplus records beyond the capacity are freed.
    #[inline]
    pub(crate) fn push(&mut self, record: Box<RetireRecord>) {
        debug_assert!(record.destructor.is_none(), "BUG: pooling a pending record");
        if self.capacity.is_none_or(|cap| self.free.len() < cap) {
            self.free.push(record);
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.free.len()
    }
}
