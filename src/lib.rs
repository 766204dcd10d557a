//! Hazard-pointer based deferred memory reclamation.
//!
//! This crate is the reclamation substrate for lock-free data structures: it lets
//! threads free nodes they unlinked from a shared structure without ever freeing a
//! node another thread is still dereferencing, and without taking a lock.
//!
//! - A [`HazardDomain`] owns a lock-free, grow-only registry of hazard slots
//!   shared by every thread using one structure.
//! - Each thread obtains a [`Reclaimer`] from the domain. It announces the
//!   addresses it is about to dereference, retires unlinked nodes with a
//!   destructor, and periodically sweeps the retirements no thread announces.
//!
//! # Example
//!
//! ```
//! use std::sync::atomic::{AtomicPtr, Ordering};
//! use hazard_reclaim::HazardDomain;
//!
//! let domain = HazardDomain::new();
//! let shared = AtomicPtr::new(Box::into_raw(Box::new(1u32)));
//!
//! let mut reclaimer = domain.register();
//!
//! // Reader side: announce, then dereference.
//! let current = reclaimer.protect(0, &shared);
//! assert_eq!(unsafe { *current }, 1);
//! reclaimer.clear_hazard(0);
//!
//! // Writer side: unlink, then retire instead of freeing.
//! let old = shared.swap(Box::into_raw(Box::new(2u32)), Ordering::AcqRel);
//! unsafe { reclaimer.retire_box(old) };
//! reclaimer.reclaim_now();
//!
//! drop(reclaimer);
//! unsafe { drop(Box::from_raw(shared.load(Ordering::Acquire))) };
//! ```
//!
//! 基于危险指针的延迟内存回收。
//! 本 crate 是无锁数据结构的回收基础设施：它让线程在不加锁的情况下，
//! 安全释放从共享结构中解链的节点，且永远不会释放其他线程仍在解引用的节点。

mod config;
mod domain;
mod error;
mod reclaimer;
mod registry;
mod retired;
mod slot;
mod sync;

pub use domain::{HazardDomain, HazardDomainBuilder};
pub use error::ConfigError;
pub use reclaimer::Reclaimer;

#[cfg(all(test, not(feature = "loom")))]
mod tests;
