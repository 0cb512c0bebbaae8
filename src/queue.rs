//! Shared work queue between the task source and the workers
//!
//! Targets sit in a crossbeam `Injector`; a semaphore holds one permit per
//! free slot so the queue stays bounded, and a `Notify` wakes parked workers.
//! Closing only means "no more work": workers drain what is left and then
//! see `None`.

use crate::{
    errors::{PoolError, Result},
    model::Target,
};
use crossbeam::deque::{Injector, Steal};
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};
use tokio::sync::{Notify, Semaphore, TryAcquireError};

struct Inner {
    items: Injector<Target>,
    slots: Semaphore,
    notify: Notify,
    closed: AtomicBool,
    len: AtomicUsize,
    capacity: usize,
}

#[derive(Clone)]
pub struct WorkQueue {
    inner: Arc<Inner>,
}

impl WorkQueue {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Arc::new(Inner {
                items: Injector::new(),
                slots: Semaphore::new(capacity),
                notify: Notify::new(),
                closed: AtomicBool::new(false),
                len: AtomicUsize::new(0),
                capacity,
            }),
        }
    }

    /// Enqueue, waiting for a free slot if the queue is full
    pub async fn push(&self, target: Target) -> Result<()> {
        if self.is_closed() {
            return Err(PoolError::QueueClosed);
        }
        let permit = self
            .inner
            .slots
            .acquire()
            .await
            .map_err(|_| PoolError::QueueClosed)?;
        // the slot is handed back by whoever pops the target
        permit.forget();
        self.enqueue(target);
        Ok(())
    }

    /// Enqueue without waiting
    pub fn try_push(&self, target: Target) -> Result<()> {
        if self.is_closed() {
            return Err(PoolError::QueueClosed);
        }
        match self.inner.slots.try_acquire() {
            Ok(permit) => {
                permit.forget();
                self.enqueue(target);
                Ok(())
            }
            Err(TryAcquireError::NoPermits) => Err(PoolError::QueueFull),
            Err(TryAcquireError::Closed) => Err(PoolError::QueueClosed),
        }
    }

    #[inline(always)]
    fn enqueue(&self, target: Target) {
        self.inner.len.fetch_add(1, Ordering::Relaxed);
        self.inner.items.push(target);
        self.inner.notify.notify_one();
    }

    pub fn try_pop(&self) -> Option<Target> {
        loop {
            match self.inner.items.steal() {
                Steal::Success(target) => {
                    self.inner.len.fetch_sub(1, Ordering::Relaxed);
                    self.inner.slots.add_permits(1);
                    return Some(target);
                }
                Steal::Empty => return None,
                Steal::Retry => std::hint::spin_loop(),
            }
        }
    }

    /// Next target, or `None` once the queue is closed and empty
    pub async fn pop(&self) -> Option<Target> {
        loop {
            // register interest before checking so a push or close between the
            // check and the await is not missed
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(target) = self.try_pop() {
                return Some(target);
            }
            if self.inner.closed.load(Ordering::Acquire) {
                return self.try_pop();
            }
            notified.await;
        }
    }

    /// Close the queue. Returns `true` only for the call that actually closed it.
    pub fn close(&self) -> bool {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.inner.slots.close();
        self.inner.notify.notify_waiters();
        true
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }
}
