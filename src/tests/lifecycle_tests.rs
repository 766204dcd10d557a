/// 生命周期测试模块
/// 测试线程退出时槽的归还与复用、待回收对象的排空以及违约检测

use super::{addr, counting_destructor, init_tracing};
use crate::HazardDomain;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;

/// 测试1: 线程 A 退出后，线程 B 复用同一个槽而不增长 slot_count
#[test]
fn test_slot_reused_after_thread_exit() {
    let domain = HazardDomain::new();

    let a = domain.clone();
    thread::spawn(move || {
        let mut reclaimer = a.register();
        reclaimer.mark_hazard(0, addr(1));
        reclaimer.clear_hazard(0);
    })
    .join()
    .unwrap();
    assert_eq!(domain.slot_count(), 1);

    let b = domain.clone();
    thread::spawn(move || {
        let mut reclaimer = b.register();
        reclaimer.mark_hazard(0, addr(2));
        assert_eq!(b.slot_count(), 1);
        reclaimer.clear_hazard(0);
    })
    .join()
    .unwrap();
    assert_eq!(domain.slot_count(), 1);
}

/// 测试2: 同时存活的 Reclaimer 各自持有不同的槽
#[test]
fn test_live_reclaimers_grow_registry() {
    let domain = HazardDomain::new();
    let mut first = domain.register();
    let mut second = domain.register();

    first.mark_hazard(0, addr(1));
    second.mark_hazard(0, addr(2));
    assert_eq!(domain.slot_count(), 2);
    assert_eq!(first.get_hazard(0), addr(1));
    assert_eq!(second.get_hazard(0), addr(2));

    first.clear_hazard(0);
    second.clear_hazard(0);
    drop(first);

    // 被释放的槽可以被下一个 Reclaimer 获取
    let mut third = domain.register();
    third.get_hazard(0);
    assert_eq!(domain.slot_count(), 2);
}

/// 测试3: drop 时排空所有待回收对象
#[test]
fn test_teardown_drains_pending() {
    init_tracing();
    let domain = HazardDomain::builder().auto_reclaim(false).build().unwrap();
    let (count, destructor) = counting_destructor();

    {
        let mut reclaimer = domain.register();
        reclaimer.get_hazard(0);
        for i in 0..16 {
            reclaimer.retire(addr(i), destructor());
        }
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    assert_eq!(count.load(Ordering::SeqCst), 16);
}

/// 测试4: 退出的线程等待其他线程清除对其退休地址的公告
#[test]
fn test_teardown_waits_for_foreign_hazard() {
    let domain = HazardDomain::builder().auto_reclaim(false).build().unwrap();
    let (count, destructor) = counting_destructor();
    let release = Arc::new(AtomicBool::new(false));

    let (announced_tx, announced_rx) = mpsc::channel();
    let holder_domain = domain.clone();
    let holder_release = release.clone();
    let holder = thread::spawn(move || {
        let mut reclaimer = holder_domain.register();
        reclaimer.mark_hazard(0, addr(9));
        announced_tx.send(()).unwrap();
        while !holder_release.load(Ordering::SeqCst) {
            thread::yield_now();
        }
        reclaimer.clear_hazard(0);
    });
    announced_rx.recv().unwrap();

    let exiting_domain = domain.clone();
    let exiting = thread::spawn(move || {
        let mut reclaimer = exiting_domain.register();
        reclaimer.retire(addr(9), destructor());
        // drop 在这里阻塞，直到 holder 清除公告
    });

    thread::sleep(Duration::from_millis(50));
    assert!(!exiting.is_finished());
    assert_eq!(count.load(Ordering::SeqCst), 0);

    release.store(true, Ordering::SeqCst);
    exiting.join().unwrap();
    holder.join().unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

/// 测试5: 仍持有公告时退出是致命的调用者错误
#[test]
#[should_panic(expected = "BUG: thread exiting while hazard index 1")]
fn test_exit_with_live_hazard_panics() {
    let domain = HazardDomain::new();
    let mut reclaimer = domain.register();
    reclaimer.mark_hazard(0, addr(1));
    reclaimer.mark_hazard(1, addr(2));
    reclaimer.clear_hazard(0);
    drop(reclaimer);
}

/// 测试6: 域在所有 Reclaimer 之后才释放注册表
#[test]
fn test_domain_dropped_before_reclaimer() {
    let (count, destructor) = counting_destructor();
    let mut reclaimer = {
        let domain = HazardDomain::builder().auto_reclaim(false).build().unwrap();
        domain.register()
    };

    reclaimer.mark_hazard(0, addr(3));
    reclaimer.retire(addr(4), destructor());
    reclaimer.clear_hazard(0);
    drop(reclaimer);
    assert_eq!(count.load(Ordering::SeqCst), 1);
}
