use crate::config::Config;
use crate::error::ConfigError;
use crate::reclaimer::Reclaimer;
use crate::registry::HazardRegistry;
use crate::sync::Arc;
use std::collections::HashSet;
use std::sync::Arc as StdArc;

/// Builder for configuring a `HazardDomain`.
///
/// Use this builder to customize reclamation behavior:
/// - `reclaim_coefficient`: how many pending retirements per hazard slot trigger a sweep
/// - `auto_reclaim`: whether `retire` attempts a sweep on its own
/// - `pool_capacity`: how many recycled retirement records each thread keeps
/// - `yield_with`: the pause used while teardown waits for a hazard to clear
///
/// # Example
/// ```
/// use hazard_reclaim::HazardDomain;
///
/// let domain = HazardDomain::builder()
///     .reclaim_coefficient(2.0)
///     .pool_capacity(64)
///     .build()
///     .unwrap();
/// ```
///
/// 用于配置 `HazardDomain` 的构建器。
pub struct HazardDomainBuilder {
    config: Config,
}

impl HazardDomainBuilder {
    /// Create a new builder with default settings.
    /// 创建一个带有默认设置的新构建器。
    #[inline]
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Set the reclamation coefficient.
    ///
    /// A thread sweeps once its pending retirements reach
    /// `ceil(coefficient * slot_count)`. Higher values mean fewer scans but more
    /// outstanding retired memory; lower values mean more scans and a tighter bound.
    ///
    /// Default: `4.25`
    ///
    /// 设置回收系数。
    /// 当线程的待回收数量达到 `ceil(coefficient * slot_count)` 时进行扫描。
    /// 值越大扫描越少但未释放内存越多；值越小扫描越多但内存上界越紧。
    #[inline]
    pub fn reclaim_coefficient(mut self, coefficient: f64) -> Self {
        self.config.reclaim_coefficient = coefficient;
        self
    }

    /// Enable or disable the sweep attempt after every `retire`.
    ///
    /// Default: `true`
    ///
    /// 启用或禁用每次 `retire` 之后的扫描尝试。
    #[inline]
    pub fn auto_reclaim(mut self, enabled: bool) -> Self {
        self.config.auto_reclaim = enabled;
        self
    }

    /// Cap the number of recycled retirement records kept per thread.
    /// Pass `None` to keep every record.
    ///
    /// Default: `None`
    ///
    /// 限制每个线程保留的可复用退休记录数量。传递 `None` 保留所有记录。
    #[inline]
    pub fn pool_capacity(mut self, capacity: impl Into<Option<usize>>) -> Self {
        self.config.pool_capacity = capacity.into();
        self
    }

    /// Replace the pause used by `Reclaimer::wait_until_unprotected`.
    ///
    /// Default: `std::thread::yield_now`
    ///
    /// 替换 `Reclaimer::wait_until_unprotected` 使用的暂停原语。
    #[inline]
    pub fn yield_with<F>(mut self, pause: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.config.yield_hook = StdArc::new(pause);
        self
    }

    /// Build the `HazardDomain` with the configured settings.
    /// 使用配置的设置构建 `HazardDomain`。
    pub fn build(self) -> Result<HazardDomain, ConfigError> {
        let coefficient = self.config.reclaim_coefficient;
        if !coefficient.is_finite() {
            return Err(ConfigError::NonFiniteCoefficient(coefficient));
        }
        if coefficient < 0.0 {
            return Err(ConfigError::NegativeCoefficient(coefficient));
        }

        Ok(HazardDomain {
            registry: Arc::new(HazardRegistry::new()),
            config: self.config,
        })
    }
}

impl Default for HazardDomainBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A hazard-pointer reclamation domain.
///
/// `HazardDomain` owns the shared registry of hazard slots that every thread
/// announces into. Each thread working on the protected structure obtains its
/// own `Reclaimer` through `register()` and keeps it for as long as it runs.
///
/// `HazardDomain` is `Clone` and can be safely shared across threads.
/// Typically, you create one domain per data structure and clone it into the
/// threads that use that structure.
///
/// **Typical Usage**:
/// ```
/// use hazard_reclaim::HazardDomain;
///
/// let domain = HazardDomain::new();
/// let mut reclaimer = domain.register();
///
/// let node = Box::into_raw(Box::new(7u64));
/// reclaimer.mark_hazard(0, node.cast());
/// // ... dereference `node` ...
/// reclaimer.clear_hazard(0);
///
/// unsafe { reclaimer.retire_box(node) };
/// ```
///
/// 危险指针回收域。
/// `HazardDomain` 持有所有线程公告所用的共享危险槽注册表。
/// 每个操作受保护结构的线程通过 `register()` 获得自己的 `Reclaimer`，
/// 并在运行期间一直持有它。
/// `HazardDomain` 是 `Clone` 的，可以安全地在线程间共享。
#[derive(Clone, Debug)]
pub struct HazardDomain {
    pub(crate) registry: Arc<HazardRegistry>,
    pub(crate) config: Config,
}

impl HazardDomain {
    /// Create a new domain with the default reclamation coefficient.
    /// 创建一个使用默认回收系数的新域。
    #[inline]
    pub fn new() -> Self {
        Self {
            registry: Arc::new(HazardRegistry::new()),
            config: Config::default(),
        }
    }

    /// Create a builder for configuring the domain.
    /// 创建一个用于配置域的构建器。
    #[inline]
    pub fn builder() -> HazardDomainBuilder {
        HazardDomainBuilder::new()
    }

    /// Create the reclamation engine for the current thread.
    ///
    /// The caller is responsible for using each `Reclaimer` from one thread
    /// only (it is `!Send`), and for clearing its hazards before dropping it.
    ///
    /// 为当前线程创建回收引擎。
    /// 调用者有责任确保每个 `Reclaimer` 仅由一个线程使用（它是 `!Send` 的），
    /// 并在 drop 之前清除其所有危险指针。
    #[inline]
    pub fn register(&self) -> Reclaimer {
        Reclaimer::new(Arc::clone(&self.registry), self.config.clone())
    }

    /// Total number of hazard slots ever allocated in this domain.
    /// 此域中已分配的危险槽总数。
    #[inline]
    pub fn slot_count(&self) -> usize {
        self.registry.slot_count()
    }

    /// Whether any thread currently announces `address`.
    /// 是否有任何线程当前公告了 `address`。
    #[inline]
    pub fn is_protected(&self, address: *mut ()) -> bool {
        self.registry.is_protected(address)
    }

    /// Snapshot of every address currently announced in this domain.
    /// 此域中当前所有已公告地址的快照。
    pub fn protected_addresses(&self) -> HashSet<*mut ()> {
        self.registry.snapshot_protected_addresses()
    }

    #[inline]
    pub fn reclaim_coefficient(&self) -> f64 {
        self.config.reclaim_coefficient
    }

    /// Pending retirements a thread must reach before a sweep runs,
    /// for the current slot count.
    #[inline]
    pub fn reclaim_threshold(&self) -> usize {
        self.config.threshold(self.slot_count())
    }
}

impl Default for HazardDomain {
    fn default() -> Self {
        Self::new()
    }
}
