use std::sync::{Condvar, Mutex, Weak};

use dashmap::DashMap;
use slog::Logger;

use crate::actor::cell::ActorCell;
use crate::actor::id::{ActorId, ExitReason, IdGenerator, SystemMsg};
use crate::actor::handle::ActorRef;
use crate::envelope::Message;
use crate::error::RegistryLookupError;

struct Entry<M: Message> {
    weak: Option<Weak<ActorCell<M>>>,
    reason: Option<ExitReason>,
}

/// Process-wide directory of actors: id allocation, id-to-actor lookup, and
/// the running-actor-count barrier used by `await_all_others_done`.
///
/// Grounded in `cppa::detail::actor_registry` (a `std::map` guarded by a
/// spinlock, plus atomics + a mutex/condvar pair for the running count);
/// the map itself is a `DashMap` here, the same choice `riker`'s provider
/// makes for its own many-reader registry-like structure.
pub struct Registry<M: Message> {
    entries: DashMap<ActorId, Entry<M>>,
    id_gen: IdGenerator,
    running: Mutex<u64>,
    running_cv: Condvar,
    dead_letters: Mutex<Vec<ActorRef<M>>>,
    log: Logger,
}

impl<M: Message> Registry<M> {
    pub fn new(log: Logger) -> Self {
        Registry {
            entries: DashMap::new(),
            id_gen: IdGenerator::new(),
            running: Mutex::new(0),
            running_cv: Condvar::new(),
            dead_letters: Mutex::new(Vec::new()),
            log,
        }
    }

    /// Registers `actor` to receive a copy of every message that a `send`
    /// could not deliver because its target had already exited (spec §7).
    /// Subscribers are pushed to with a plain `send`, so a full or gone
    /// subscriber just drops its own copy rather than affecting anyone
    /// else's.
    pub(crate) fn subscribe_dead_letters(&self, actor: ActorRef<M>) {
        self.dead_letters.lock().unwrap().push(actor);
    }

    /// Forwards one undeliverable message to every dead-letter subscriber.
    pub(crate) fn route_dead_letter(&self, target: ActorId, msg: M) {
        let subscribers = self.dead_letters.lock().unwrap();
        if subscribers.is_empty() {
            return;
        }
        slog::warn!(self.log, "routing dead letter"; "target" => target.to_string());
        for sub in subscribers.iter() {
            let _ = sub.send(None, msg.clone());
        }
    }

    pub fn next_id(&self) -> ActorId {
        self.id_gen.next_id()
    }

    pub(crate) fn register(&self, cell: &std::sync::Arc<ActorCell<M>>) {
        self.entries.insert(
            cell.id(),
            Entry {
                weak: Some(std::sync::Arc::downgrade(cell)),
                reason: None,
            },
        );
        self.inc_running();
        slog::debug!(self.log, "actor registered"; "actor" => cell.id().to_string());
    }

    pub fn get(&self, id: ActorId) -> Result<ActorRef<M>, RegistryLookupError> {
        match self.entries.get(&id) {
            Some(entry) => match &entry.weak {
                Some(weak) => match weak.upgrade() {
                    Some(cell) => Ok(ActorRef::from_cell(cell)),
                    None => Err(RegistryLookupError {
                        id,
                        reason: entry.reason.clone().unwrap_or(ExitReason::Unhandled),
                    }),
                },
                None => Err(RegistryLookupError {
                    id,
                    reason: entry.reason.clone().unwrap_or(ExitReason::Unhandled),
                }),
            },
            None => Err(RegistryLookupError {
                id,
                reason: ExitReason::Unhandled,
            }),
        }
    }

    pub(crate) fn clear_ref(&self, id: ActorId, reason: ExitReason) {
        if let Some(mut entry) = self.entries.get_mut(&id) {
            entry.weak = None;
            entry.reason = Some(reason.clone());
        }
        slog::debug!(self.log, "actor exited"; "actor" => id.to_string(), "reason" => reason.to_string());
    }

    /// Delivers a system message to `id` if it is still resolvable,
    /// scheduling its actor back onto the pool when the notification wakes
    /// it from sleep. Silently drops the notification if the target has
    /// already been fully reclaimed, which can only happen after it has
    /// already run its own exit path.
    pub(crate) fn notify_system(&self, id: ActorId, msg: SystemMsg) {
        let cell = match self.entries.get(&id) {
            Some(entry) => entry.weak.as_ref().and_then(|w| w.upgrade()),
            None => None,
        };
        match cell {
            Some(cell) => {
                let woke = cell.mailbox().enqueue_system(msg);
                if woke && !cell.detached() {
                    cell.system().scheduler().schedule(cell.clone());
                }
            }
            None => {
                slog::warn!(self.log, "dropping system notification, target already reclaimed"; "target" => id.to_string());
            }
        }
    }

    pub(crate) fn inc_running(&self) {
        let mut count = self.running.lock().unwrap();
        *count += 1;
    }

    pub(crate) fn dec_running(&self) {
        let mut count = self.running.lock().unwrap();
        *count -= 1;
        self.running_cv.notify_all();
    }

    pub fn running_count(&self) -> u64 {
        *self.running.lock().unwrap()
    }

    /// Blocks the calling thread until the running-actor count reaches
    /// `expected`. With `expected == 0` this is `await_all_others_done`
    /// (spec §4.6); `cppa`'s `await_running_count_equal` supports the same
    /// generality.
    pub fn await_running_count_equal(&self, expected: u64) {
        let count = self.running.lock().unwrap();
        let _count = self
            .running_cv
            .wait_while(count, |c| *c != expected)
            .unwrap();
    }
}
