use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use slog::Logger;

use crate::actor::cell::ActorCell;
use crate::envelope::Message;
use crate::kernel::queue::Queue;
use crate::receive::{resume, run_thread_body, Context};

/// Fixed worker-thread pool plus the shared ready-queue event-based actors
/// are pulled from (spec §4.6). Detached (thread-backed) actors bypass
/// this entirely and get a dedicated `JoinHandle` of their own.
///
/// Grounded in `cppa::detail::task_scheduler`'s single job queue feeding a
/// worker thread, scaled out to a configurable pool the way this spec
/// requires.
pub struct Scheduler<M: Message> {
    ready_queue: Queue<Arc<ActorCell<M>>>,
    wake_lock: Mutex<()>,
    wake_cv: Condvar,
    shutting_down: AtomicBool,
    workers: Mutex<Vec<JoinHandle<()>>>,
    detached: Mutex<Vec<JoinHandle<()>>>,
    log: Logger,
}

impl<M: Message> Scheduler<M> {
    pub(crate) fn new(log: Logger) -> Arc<Self> {
        Arc::new(Scheduler {
            ready_queue: Queue::new(),
            wake_lock: Mutex::new(()),
            wake_cv: Condvar::new(),
            shutting_down: AtomicBool::new(false),
            workers: Mutex::new(Vec::new()),
            detached: Mutex::new(Vec::new()),
            log,
        })
    }

    pub(crate) fn start(self: &Arc<Self>, pool_size: usize) {
        let mut workers = self.workers.lock().unwrap();
        for idx in 0..pool_size.max(1) {
            let scheduler = self.clone();
            let handle = thread::Builder::new()
                .name(format!("relay-rt-worker-{}", idx))
                .spawn(move || scheduler.worker_loop())
                .expect("failed to spawn worker thread");
            workers.push(handle);
        }
    }

    pub fn schedule(&self, cell: Arc<ActorCell<M>>) {
        self.ready_queue.push(cell);
        let _guard = self.wake_lock.lock().unwrap();
        self.wake_cv.notify_one();
    }

    pub(crate) fn spawn_detached(&self, cell: Arc<ActorCell<M>>, body: Box<dyn FnOnce(&Context<M>) + Send>) {
        let mut detached = self.detached.lock().unwrap();
        let handle = thread::Builder::new()
            .name(format!("relay-rt-actor-{}", cell.id()))
            .spawn(move || run_thread_body(cell, body))
            .expect("failed to spawn detached actor thread");
        detached.push(handle);
    }

    fn worker_loop(self: Arc<Self>) {
        loop {
            match self.ready_queue.try_pop() {
                Some(cell) => resume(cell),
                None => {
                    if self.shutting_down.load(Ordering::Acquire) {
                        return;
                    }
                    let guard = self.wake_lock.lock().unwrap();
                    if self.ready_queue.is_empty() && !self.shutting_down.load(Ordering::Acquire) {
                        let _ = self.wake_cv.wait_timeout(guard, Duration::from_millis(100)).unwrap();
                    }
                }
            }
        }
    }

    /// Signals every worker to drain the run-queue and exit, then joins
    /// them. Does not touch detached actor threads — those own their exit
    /// condition independently and are joined on drop.
    pub(crate) fn shutdown(&self) {
        self.shutting_down.store(true, Ordering::Release);
        {
            let _guard = self.wake_lock.lock().unwrap();
            self.wake_cv.notify_all();
        }
        let mut workers = self.workers.lock().unwrap();
        for handle in workers.drain(..) {
            let _ = handle.join();
        }
        slog::debug!(self.log, "scheduler shut down");
    }
}
