use std::fmt;
use std::sync::Arc as StdArc;

/// Default reclamation coefficient.
///
/// A sweep runs once a thread holds `coefficient * slot_count` pending
/// retirements.
///
/// 默认回收系数。当一个线程持有 `coefficient * slot_count` 个待回收对象时执行扫描。
pub(crate) const DEFAULT_RECLAIM_COEFFICIENT: f64 = 4.25;

/// Injected pause used while waiting for a hazard to clear.
/// 等待危险指针被清除时使用的可注入暂停原语。
pub(crate) type YieldHook = StdArc<dyn Fn() + Send + Sync>;

/// Per-domain settings, copied into every `Reclaimer` at registration.
/// 域级设置，在注册时复制到每个 `Reclaimer` 中。
#[derive(Clone)]
pub(crate) struct Config {
    pub(crate) reclaim_coefficient: f64,
    pub(crate) auto_reclaim: bool,
    pub(crate) pool_capacity: Option<usize>,
    pub(crate) yield_hook: YieldHook,
}

impl Config {
    /// Pending retirements needed before a sweep runs for `slot_count` slots.
    #[inline]
    pub(crate) fn threshold(&self, slot_count: usize) -> usize {
        (self.reclaim_coefficient * slot_count as f64).ceil() as usize
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reclaim_coefficient: DEFAULT_RECLAIM_COEFFICIENT,
            auto_reclaim: true,
            pool_capacity: None,
            yield_hook: StdArc::new(crate::sync::yield_now),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("reclaim_coefficient", &self.reclaim_coefficient)
            .field("auto_reclaim", &self.auto_reclaim)
            .field("pool_capacity", &self.pool_capacity)
            .finish_non_exhaustive()
    }
}
