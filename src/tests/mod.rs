mod lifecycle_tests;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// 用于测试的伪地址（只按身份比较，从不解引用）
pub(crate) fn addr(n: usize) -> *mut () {
    ((n + 1) * 64) as *mut ()
}

/// 返回一个计数器和一个每次调用时递增它的析构函数
pub(crate) fn counting_destructor() -> (Arc<AtomicUsize>, impl Fn() -> Box<dyn FnOnce(*mut ())>) {
    let counter = Arc::new(AtomicUsize::new(0));
    let seen = counter.clone();
    let make = move || {
        let seen = seen.clone();
        Box::new(move |_: *mut ()| {
            seen.fetch_add(1, Ordering::SeqCst);
        }) as Box<dyn FnOnce(*mut ())>
    };
    (counter, make)
}

/// 安装 fmt 订阅者，让 tracing 事件出现在测试输出中
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}
