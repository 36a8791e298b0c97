use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use slog::Logger;

use crate::actor::id::SystemMsg;
use crate::envelope::{Envelope, Message};
use crate::kernel::queue::Queue;

/// States a mailbox's owning actor can be in from the scheduler's point of
/// view. `Done` means the actor has exited and will never be scheduled
/// again.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum SchedulingState {
    Ready = 0,
    AboutToBlock = 1,
    Blocked = 2,
    Done = 3,
}

impl SchedulingState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => SchedulingState::Ready,
            1 => SchedulingState::AboutToBlock,
            2 => SchedulingState::Blocked,
            _ => SchedulingState::Done,
        }
    }
}

pub enum BlockResult {
    Blocked,
    Retry,
}

/// Outcome of a blocking mailbox fetch.
pub enum Fetched<M> {
    Message(M),
    Timeout,
}

/// Per-actor mailbox: a user-message queue, a system-message queue that is
/// always drained first, and the atomics that arbitrate the producer/
/// consumer handoff (spec §4.2).
pub struct Mailbox<M: Message> {
    queue: Queue<Envelope<M>>,
    sys_queue: Queue<SystemMsg>,
    state: AtomicU8,
    wait_lock: Mutex<()>,
    wait_cv: Condvar,
    msg_process_limit: u32,
    log: Logger,
}

impl<M: Message> Mailbox<M> {
    pub fn new(msg_process_limit: u32, log: Logger) -> Self {
        Mailbox {
            queue: Queue::new(),
            sys_queue: Queue::new(),
            state: AtomicU8::new(SchedulingState::Blocked as u8),
            wait_lock: Mutex::new(()),
            wait_cv: Condvar::new(),
            msg_process_limit,
            log,
        }
    }

    pub fn msg_process_limit(&self) -> u32 {
        self.msg_process_limit
    }

    pub fn scheduling_state(&self) -> SchedulingState {
        SchedulingState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, s: SchedulingState) {
        self.state.store(s as u8, Ordering::Release);
    }

    fn cas_state(&self, from: SchedulingState, to: SchedulingState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty() && self.sys_queue.is_empty()
    }

    /// Enqueues a system message (exit/linked-down notification). These
    /// always jump ahead of user messages in `try_fetch`.
    pub fn enqueue_system(&self, msg: SystemMsg) -> bool {
        slog::trace!(self.log, "enqueue system message"; "msg" => format!("{:?}", msg));
        let was_empty = self.sys_queue.push_returning_was_empty(msg);
        self.wake_if_needed(was_empty)
    }

    /// Enqueues a user message. Returns `true` if this call is responsible
    /// for handing the actor back to the scheduler (event-based) or for
    /// waking a blocked consumer thread (thread-backed) — i.e. the push
    /// found the mailbox asleep.
    pub fn enqueue(&self, envelope: Envelope<M>) -> bool {
        slog::trace!(self.log, "enqueue message");
        let was_empty = self.queue.push_returning_was_empty(envelope);
        self.wake_if_needed(was_empty)
    }

    fn wake_if_needed(&self, was_empty: bool) -> bool {
        if !was_empty {
            return false;
        }
        let woke = self.cas_state(SchedulingState::Blocked, SchedulingState::Ready)
            || self.cas_state(SchedulingState::AboutToBlock, SchedulingState::Ready);
        if woke {
            let _guard = self.wait_lock.lock().unwrap();
            self.wait_cv.notify_all();
        }
        woke
    }

    /// Non-blocking fetch used by the scheduler's `resume` loop. System
    /// messages always take priority over user messages.
    pub fn try_fetch_system(&self) -> Option<SystemMsg> {
        self.sys_queue.try_pop()
    }

    pub fn try_fetch(&self) -> Option<Envelope<M>> {
        self.queue.try_pop()
    }

    /// The double-check suspend protocol: transition `Ready -> AboutToBlock`,
    /// re-examine the queues, and only commit to `Blocked` if nothing
    /// arrived in between. Closes the race between a producer's enqueue and
    /// this actor's decision to sleep (spec §4.2, invariant 5).
    pub fn try_block(&self) -> BlockResult {
        if !self.cas_state(SchedulingState::Ready, SchedulingState::AboutToBlock) {
            return BlockResult::Retry;
        }
        if !self.is_empty() {
            self.set_state(SchedulingState::Ready);
            return BlockResult::Retry;
        }
        if self.cas_state(SchedulingState::AboutToBlock, SchedulingState::Blocked) {
            BlockResult::Blocked
        } else {
            BlockResult::Retry
        }
    }

    pub fn mark_ready(&self) {
        self.set_state(SchedulingState::Ready);
    }

    pub fn mark_done(&self) {
        self.set_state(SchedulingState::Done);
    }

    /// Blocking fetch for thread-backed actors: parks the owning OS thread
    /// on the mailbox condvar instead of handing control back to a
    /// scheduler worker. `deadline` implements the timed-receive clause.
    pub fn await_message(&self, deadline: Option<Instant>) -> Fetched<Envelope<M>> {
        loop {
            if let Some(sys) = self.try_fetch_system() {
                // thread-backed actors see system messages through the same
                // trap-exit path as event-based ones; callers drain this via
                // try_fetch_system before calling await_message again.
                self.enqueue_system(sys);
            }
            if let Some(env) = self.try_fetch() {
                return Fetched::Message(env);
            }

            // Same double-check protocol the pooled scheduler's `resume`
            // loop relies on (spec §4.2, invariant 5): commit to `Blocked`
            // only if the queues are still empty after the state flip, so a
            // concurrent `enqueue`'s `wake_if_needed` can never land between
            // our emptiness check and our decision to sleep.
            match self.try_block() {
                BlockResult::Retry => continue,
                BlockResult::Blocked => {}
            }

            let guard = self.wait_lock.lock().unwrap();
            // `wake_if_needed` always flips the state back to `Ready` before
            // taking this same lock to notify, so if we're still `Blocked`
            // here the wakeup we're about to wait for hasn't happened yet.
            if self.scheduling_state() != SchedulingState::Blocked {
                continue;
            }
            match deadline {
                None => {
                    drop(self.wait_cv.wait(guard).unwrap());
                }
                Some(when) => {
                    let now = Instant::now();
                    if now >= when {
                        self.mark_ready();
                        return Fetched::Timeout;
                    }
                    let (_guard, timeout_result) = self.wait_cv.wait_timeout(guard, when - now).unwrap();
                    if timeout_result.timed_out() && self.scheduling_state() == SchedulingState::Blocked {
                        self.mark_ready();
                        return Fetched::Timeout;
                    }
                }
            }
        }
    }

    pub fn await_message_for(&self, timeout: Duration) -> Fetched<Envelope<M>> {
        self.await_message(Some(Instant::now() + timeout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_blocked_while_nonempty() {
        let mbox: Mailbox<u32> = Mailbox::new(10, crate::system::logger::discard_log());
        mbox.mark_ready();
        mbox.enqueue(Envelope::new(1, None));
        match mbox.try_block() {
            BlockResult::Retry => {}
            BlockResult::Blocked => panic!("mailbox reported blocked while non-empty"),
        }
    }

    #[test]
    fn blocks_when_truly_empty() {
        let mbox: Mailbox<u32> = Mailbox::new(10, crate::system::logger::discard_log());
        mbox.mark_ready();
        match mbox.try_block() {
            BlockResult::Blocked => {}
            BlockResult::Retry => panic!("expected to block on empty mailbox"),
        }
        assert_eq!(mbox.scheduling_state(), SchedulingState::Blocked);
    }

    #[test]
    fn enqueue_wakes_blocked_mailbox() {
        let mbox: Mailbox<u32> = Mailbox::new(10, crate::system::logger::discard_log());
        mbox.mark_ready();
        matches!(mbox.try_block(), BlockResult::Blocked);
        let woke = mbox.enqueue(Envelope::new(7, None));
        assert!(woke);
        assert_eq!(mbox.scheduling_state(), SchedulingState::Ready);
    }
}
